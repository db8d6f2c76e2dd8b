// ABOUTME: Command implementations for the table-copy CLI
// ABOUTME: Exports the transfer command and its request/outcome types

pub mod transfer;

pub use transfer::{
    transfer, TransferOutcome, TransferRequest, TransferStage, DEFAULT_BATCH_SIZE,
};
