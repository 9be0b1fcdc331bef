//! Typewire Core
//!
//! Type descriptors, procedure metadata, the service-side marshaller and the
//! JSON-RPC procedure registry shared by the exporter and the CLI.

pub mod descriptor;
pub mod marshal;
pub mod metadata;
pub mod rpc;
pub mod values;

pub use descriptor::{
    DescriptorError, EnumDef, EnumLiteral, EnumMember, Field, GenericRecordDef, PrimitiveKind, RecordDef,
    TemporalKind, TypeDescriptor,
};
pub use marshal::MarshalError;
pub use metadata::{MetadataProvider, ProcedureInfo, ProcedureSet};
pub use rpc::{AsyncFnProcedure, AsyncProcedure, FnProcedure, Procedure, Rpc, RpcError};
pub use values::Value;
