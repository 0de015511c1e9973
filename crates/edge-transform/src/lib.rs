//! The editing engine: character/word motion arithmetic, the reversible
//! `Transformation` stack, and the built-in modes that dispatch key
//! presses into transformations against an `EditorState`.

pub mod modes;
pub mod motion;
pub mod splice;
pub mod transformation;

pub use modes::{
    AdvancedMode, CommandMode, FindMode, InsertMode, LinePromptMode, RepeatMode, SecondaryMode,
    StructureMode,
};
pub use transformation::{
    Applied, ApplyRepeatedly, AtPosition, Context, Delete, DeleteCharacters, DeleteLines,
    DeleteRange, DeleteSuffixSuperfluousCharacters, DeleteWord, FinalPosition, GotoPosition,
    Insert, Move, Noop, Stack, Transformation, TransformationEdit, WithRepetitions, WordModifier,
};
