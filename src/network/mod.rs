pub mod request;

pub use request::{RequestResult, ServerId};
