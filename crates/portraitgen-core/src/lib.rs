//! Static option tables for prompt generation and the typed relations built
//! from them.

pub mod appearance;
pub mod catalog;
pub mod character;
pub mod constraints;
pub mod error;
pub mod profile;
pub mod unit;
pub mod validation;

pub use appearance::{AppearanceTables, CameraTables, SHORT_HAIR};
pub use catalog::{Choice, ChoiceTable, ColorRendering, HairColor};
pub use character::CharacterTemplate;
pub use constraints::{DEFAULT_ROLE, Identity, RoleConstraints, RoleEntry};
pub use error::{Result, TemplateError};
pub use profile::{AttireSet, RoleProfile, Substitutions};
pub use unit::{UnitTemplate, UnitTypeProfile};
pub use validation::{IssueSeverity, ValidationIssue, ValidationReport};
