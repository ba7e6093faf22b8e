//! Service layer module
//!
//! Contains the credential pool, the key-rotating generation gateway and the flow definitions

pub mod credential_pool;
pub mod flows;
pub mod gateway;

pub use credential_pool::{Credential, CredentialPool, Rotation};
pub use flows::{Flow, FlowError, FlowModels, FlowResponse, FlowRunner};
pub use gateway::{GatewayError, GatewayOutcome, GenerationGateway};
