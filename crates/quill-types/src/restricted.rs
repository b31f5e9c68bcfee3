//! The restricted-type set for UDF signatures
//!
//! Certain types may not appear as a UDF parameter or return type, either
//! directly or nested anywhere inside a non-expanding aggregate. The set is a
//! process-lifetime constant; hosts can read it to filter suggestions.

use crate::FormulaType;
use std::sync::LazyLock;

/// Types forbidden in UDF parameter and return positions
pub static RESTRICTED_TYPES: LazyLock<Vec<FormulaType>> = LazyLock::new(|| {
    vec![
        FormulaType::DateTimeNoTimeZone,
        FormulaType::Blank,
        FormulaType::Decimal,
    ]
});

/// Check whether a type is restricted, directly or through aggregate fields
///
/// Data-source types may expand to other data-source types or reference
/// themselves; aggregates carrying expansion info are not descended into.
pub fn is_restricted_type(ty: &FormulaType) -> bool {
    if !ty.has_expansion_info() {
        if let Some(shape) = ty.shape() {
            if shape.fields().iter().any(|f| is_restricted_type(&f.ty)) {
                return true;
            }
        }
    }

    RESTRICTED_TYPES.contains(ty)
}
