use thiserror::Error;

#[derive(Error, Debug)]
pub enum LakeError {
    #[error("Invalid configuration: {0}")]
    Config(String),
}
