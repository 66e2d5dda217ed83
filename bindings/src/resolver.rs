//! Scope-aware name resolution.
//!
//! A raw identifier plus an access mode becomes a table slot and flat
//! element offset. All policy lives here: suffix discipline, implicit
//! creation, declaration rules, scope fallback, and subscript checking.

use storage::MAX_CAPACITY;

use crate::binding::{BaseType, DimBound, TypeTag, EMPTY_SHAPE, MAX_BOUND, MAX_DIMS, MAX_NAME};
use crate::error::{BindError, BindResult};
use crate::options::IndexBase;
use crate::runtime::Runtime;
use crate::table::StorageRef;

/// What the caller wants done about the binding's existence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    /// Plain reference: use the binding, creating it if allowed.
    FindOrCreate,
    /// Reference that must already exist.
    FindOrError,
    /// Probe: a miss is `Ok(None)`, never an error.
    FindOrNothing,
    /// DIM-style declaration, bound at the global level.
    Declare,
    /// LOCAL-style declaration, bound at the current level. Shadows a
    /// global of the same name.
    DeclareLocal,
}

/// One resolution request.
///
/// `name` is the raw identifier with an optional trailing type suffix.
/// `indices` is `None` for a plain reference, `Some(&[])` for an explicit
/// `()` reference, and otherwise subscripts (bounds, for the declaring
/// modes).
#[derive(Clone, Copy, Debug)]
pub struct VarRequest<'a> {
    pub name: &'a str,
    pub mode: AccessMode,
    pub level: u8,
    pub implied: Option<BaseType>,
    pub indices: Option<&'a [i64]>,
    pub capacity: Option<usize>,
    pub empty_shape_ok: bool,
    pub skip_routine_check: bool,
}

impl<'a> VarRequest<'a> {
    /// Plain find-or-create reference at `level`.
    pub fn find(name: &'a str, level: u8) -> Self {
        VarRequest {
            name,
            mode: AccessMode::FindOrCreate,
            level,
            implied: None,
            indices: None,
            capacity: None,
            empty_shape_ok: false,
            skip_routine_check: false,
        }
    }

    /// DIM-style declaration issued from `level`.
    pub fn declare(name: &'a str, level: u8) -> Self {
        VarRequest {
            mode: AccessMode::Declare,
            ..VarRequest::find(name, level)
        }
    }

    /// LOCAL-style declaration at `level`.
    pub fn local(name: &'a str, level: u8) -> Self {
        VarRequest {
            mode: AccessMode::DeclareLocal,
            ..VarRequest::find(name, level)
        }
    }
}

impl Runtime {
    /// Resolves `req` to a table slot and element offset.
    ///
    /// `Ok(None)` is returned only for `FindOrNothing` misses; every other
    /// outcome is a resolved reference or an error.
    pub fn resolve(&mut self, req: &VarRequest<'_>) -> BindResult<Option<StorageRef>> {
        let parsed = parse_name(req.name)?;
        let name = parsed.text.as_str();

        // suffix beats implied beats the session default, but a suffix
        // contradicting the declaration context is a program error
        let declared = match (parsed.suffix, req.implied) {
            (Some(s), Some(i)) if s != i => {
                return Err(BindError::ConflictingType {
                    name: req.name.to_string(),
                })
            }
            (Some(s), _) => Some(TypeTag::new(s)),
            (None, Some(i)) => Some(TypeTag::implied(i)),
            (None, None) => None,
        };

        if creates(req.mode) && !req.skip_routine_check && self.routines.contains(name) {
            return Err(BindError::NameCollidesWithRoutine {
                name: name.to_string(),
            });
        }

        let (primary, global) = self.vars.find(name, req.level);
        let hit = match req.mode {
            AccessMode::DeclareLocal => primary,
            _ => primary.or(global),
        };

        if let Some(index) = hit {
            return match req.mode {
                AccessMode::Declare | AccessMode::DeclareLocal => Err(BindError::AlreadyDeclared {
                    name: name.to_string(),
                }),
                _ => self.resolve_existing(index, name, declared, req).map(Some),
            };
        }

        match req.mode {
            AccessMode::FindOrError => {
                return Err(BindError::VariableNotFound {
                    name: name.to_string(),
                })
            }
            AccessMode::FindOrNothing => return Ok(None),
            AccessMode::FindOrCreate if self.options.explicit => {
                return Err(BindError::VariableNotDeclared {
                    name: name.to_string(),
                })
            }
            _ => {}
        }
        self.create(name, declared, req).map(Some)
    }

    /// Shape and type checks against a binding that already exists.
    fn resolve_existing(
        &self,
        index: usize,
        name: &str,
        declared: Option<TypeTag>,
        req: &VarRequest<'_>,
    ) -> BindResult<StorageRef> {
        let binding = match self.vars.binding(index) {
            Some(binding) => binding,
            None => return Err(BindError::VacantSlot { index }),
        };
        if let Some(tag) = declared {
            if tag.base != binding.kind().base {
                return Err(BindError::ConflictingType {
                    name: name.to_string(),
                });
            }
        }
        let element = match req.indices {
            None => {
                if binding.is_array() {
                    return Err(BindError::ArrayDimensionMismatch {
                        name: name.to_string(),
                    });
                }
                0
            }
            Some([]) => {
                if !req.empty_shape_ok {
                    return Err(BindError::InvalidDimensions);
                }
                if !binding.is_array() {
                    return Err(BindError::ArrayDimensionMismatch {
                        name: name.to_string(),
                    });
                }
                0
            }
            Some(indices) => {
                if !binding.is_array() {
                    return Err(BindError::ArrayDimensionMismatch {
                        name: name.to_string(),
                    });
                }
                if binding.is_empty_shape() {
                    return Err(BindError::IndexOutOfBounds);
                }
                element_offset(binding.dims(), indices, self.options.base, name)?
            }
        };
        Ok(StorageRef { index, element })
    }

    /// Creates the binding a missed reference asked for.
    fn create(
        &mut self,
        name: &str,
        declared: Option<TypeTag>,
        req: &VarRequest<'_>,
    ) -> BindResult<StorageRef> {
        let level = match req.mode {
            AccessMode::Declare => 0,
            _ => req.level,
        };

        // a reference that dimensions an array, or any declaration, must
        // resolve a type; a plain scalar access may still default
        let kind = match declared {
            Some(tag) => tag,
            None => match self.options.default_type {
                Some(base) => TypeTag::new(base),
                None => {
                    if req.indices.is_some() || creates_explicitly(req.mode) {
                        return Err(BindError::TypeNotSpecified);
                    }
                    TypeTag::new(BaseType::Float)
                }
            },
        };

        let dims: Vec<DimBound> = match req.indices {
            None => Vec::new(),
            Some([]) => {
                if !req.empty_shape_ok {
                    return Err(BindError::InvalidDimensions);
                }
                vec![EMPTY_SHAPE]
            }
            Some(bounds) => {
                if bounds.len() > MAX_DIMS {
                    return Err(BindError::InvalidDimensions);
                }
                let base = self.options.base.value();
                let mut dims = Vec::with_capacity(bounds.len());
                for &bound in bounds {
                    if bound <= base || bound > MAX_BOUND {
                        return Err(BindError::InvalidDimensions);
                    }
                    dims.push(bound as DimBound);
                }
                dims
            }
        };

        let capacity = req.capacity.unwrap_or(MAX_CAPACITY);
        let index = self
            .vars
            .add(name, kind, level, &dims, capacity, self.options.base)?;

        // an access that just dimensioned the array lands on the element
        // it named; declarations land on the base element
        let element = match req.indices {
            Some(bounds) if !bounds.is_empty() && req.mode == AccessMode::FindOrCreate => {
                element_offset(&dims, bounds, self.options.base, name)?
            }
            _ => 0,
        };
        Ok(StorageRef { index, element })
    }
}

fn creates(mode: AccessMode) -> bool {
    matches!(
        mode,
        AccessMode::FindOrCreate | AccessMode::Declare | AccessMode::DeclareLocal
    )
}

fn creates_explicitly(mode: AccessMode) -> bool {
    matches!(mode, AccessMode::Declare | AccessMode::DeclareLocal)
}

struct ParsedName {
    text: String,
    suffix: Option<BaseType>,
}

/// Splits the trailing type suffix, validates identifier characters, and
/// uppercases. Names start with an ASCII letter or `_` and continue with
/// alphanumerics, `_`, or `.`.
fn parse_name(raw: &str) -> BindResult<ParsedName> {
    let (body, suffix) = match raw.as_bytes().last() {
        Some(b'%') => (&raw[..raw.len() - 1], Some(BaseType::Integer)),
        Some(b'!') => (&raw[..raw.len() - 1], Some(BaseType::Float)),
        Some(b'$') => (&raw[..raw.len() - 1], Some(BaseType::String)),
        _ => (raw, None),
    };
    let mut chars = body.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        }
        None => false,
    };
    if !valid {
        return Err(BindError::InvalidName {
            name: raw.to_string(),
        });
    }
    if body.len() > MAX_NAME {
        return Err(BindError::NameTooLong {
            name: raw.to_string(),
        });
    }
    Ok(ParsedName {
        text: body.to_ascii_uppercase(),
        suffix,
    })
}

/// Flat element offset; the first subscript varies fastest.
fn element_offset(
    dims: &[DimBound],
    indices: &[i64],
    base: IndexBase,
    name: &str,
) -> BindResult<usize> {
    if indices.len() != dims.len() {
        return Err(BindError::ArrayDimensionMismatch {
            name: name.to_string(),
        });
    }
    let base = base.value();
    let mut offset: usize = 0;
    let mut stride: usize = 1;
    for (&index, &bound) in indices.iter().zip(dims) {
        if index < base || index > bound as i64 {
            return Err(BindError::IndexOutOfBounds);
        }
        offset += (index - base) as usize * stride;
        stride *= (bound as i64 - base + 1) as usize;
    }
    Ok(offset)
}
