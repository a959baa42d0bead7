use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown animation: {name}")]
    UnknownAnimation { name: String },

    #[error("bone '{bone}' has parent {parent} but parents must precede children")]
    InvalidBoneParent { bone: String, parent: usize },

    #[error("{context} references bone {index} but the skeleton has {count} bones")]
    BoneOutOfRange {
        context: String,
        index: usize,
        count: usize,
    },

    #[error("{context} references slot {index} but the skeleton has {count} slots")]
    SlotOutOfRange {
        context: String,
        index: usize,
        count: usize,
    },

    #[error("unknown attachment '{name}' for slot {slot}")]
    UnknownAttachment { slot: usize, name: String },

    #[error("invalid draw order in animation '{animation}': {message}")]
    InvalidDrawOrder { animation: String, message: String },

    #[error(
        "timeline references transform constraint {index} but the skeleton has {count} transform constraints"
    )]
    ConstraintOutOfRange { index: usize, count: usize },

    #[error("unsupported path constraint {field} '{value}' for constraint '{constraint}'")]
    UnsupportedPathConstraintMode {
        constraint: String,
        field: String,
        value: String,
    },

    #[error("unsupported local or relative transform constraint '{constraint}'")]
    UnsupportedTransformConstraintMode { constraint: String },
}
