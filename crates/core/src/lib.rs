// Core types for the Glider playground: tool catalog, invocation history, storage

pub mod catalog;
pub mod history;
pub mod storage;

pub use catalog::{
    ParameterType, ToolCatalog, ToolCategory, ToolExample, ToolMetadata, ToolParameter,
    ToolParams, ValidationReport,
};
pub use history::{
    format_duration, format_timestamp, HistoryEntry, HistoryLog, HistoryStats, NewHistoryEntry,
};
