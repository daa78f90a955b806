//! Schema catalog: which entity kinds exist, how they nest, which kinds a
//! reference may point at, and the text grammar of leaf values.
//!
//! The engine never hard-codes a tag name. Every question about the shape of
//! the format goes through [`SchemaCatalog`]; [`crate::autosar::AutosarCatalog`]
//! is the table shipped with the crate.

use std::fmt;

/// Concrete entity kinds known to the shipped catalog.
///
/// The discriminant doubles as the row index of the static kind table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Autosar,
    ArPackage,
    SwBaseType,
    ImplementationDataType,
    ImplementationDataTypeElement,
    ApplicationPrimitiveDataType,
    SwDataDefProps,
    SwDataDefPropsConditional,
    SenderReceiverInterface,
    ClientServerInterface,
    VariableDataPrototype,
    ClientServerOperation,
    ArgumentDataPrototype,
    NumericalValueSpecification,
    TextValueSpecification,
    ApplicationSwComponentType,
    CompositionSwComponentType,
    PPortPrototype,
    RPortPrototype,
    SwcInternalBehavior,
    TimingEvent,
    DataReceivedEvent,
    RVariableInAtomicSwcInstanceRef,
    RunnableEntity,
    VariableAccess,
    AutosarVariableRef,
    SwComponentPrototype,
    AssemblySwConnector,
    PPortInCompositionInstanceRef,
    RPortInCompositionInstanceRef,
    SystemSignal,
    ISignal,
    EcuInstance,
    System,
    SystemMapping,
    SenderReceiverToSignalMapping,
    VariableDataPrototypeInSystemInstanceRef,
    SwcToEcuMapping,
    ComponentInSystemInstanceRef,
    RootSwCompositionPrototype,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Abstract kinds. A concrete kind declares the classes it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindClass {
    PackageableElement,
    AutosarDataType,
    PortInterface,
    PortPrototype,
    DataPrototype,
    SwComponentType,
    RteEvent,
    ValueSpecification,
}

/// What a child slot or reference slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindConstraint {
    Exactly(EntityKind),
    Class(KindClass),
}

impl fmt::Display for KindConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindConstraint::Exactly(kind) => write!(f, "{kind}"),
            KindConstraint::Class(class) => write!(f, "{class:?} or its sub-kinds"),
        }
    }
}

/// Value grammar of a field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Integer,
    Float,
    Boolean,
    Enum(&'static [&'static str]),
}

/// A scalar value stored in a field slot.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Enum(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

/// Lexical form written to documents.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Enum(s) => f.write_str(s),
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl ValueType {
    /// Parse the text content of a leaf element.
    pub fn parse(self, text: &str) -> Result<FieldValue, String> {
        let text = text.trim();
        match self {
            ValueType::Text => Ok(FieldValue::Text(text.to_string())),
            ValueType::Integer => text
                .parse()
                .map(FieldValue::Integer)
                .map_err(|e| format!("'{text}' is not an integer: {e}")),
            ValueType::Float => text
                .parse()
                .map(FieldValue::Float)
                .map_err(|e| format!("'{text}' is not a number: {e}")),
            ValueType::Boolean => match text {
                "true" | "1" => Ok(FieldValue::Boolean(true)),
                "false" | "0" => Ok(FieldValue::Boolean(false)),
                _ => Err(format!("'{text}' is not a boolean")),
            },
            ValueType::Enum(allowed) => {
                if allowed.contains(&text) {
                    Ok(FieldValue::Enum(text.to_string()))
                } else {
                    Err(format!("'{text}' is not one of {}", allowed.join(", ")))
                }
            }
        }
    }

    /// Convert a caller-supplied value to this slot's type.
    ///
    /// Integers widen to floats and text is checked against enum literals;
    /// everything else must already match.
    #[allow(clippy::cast_precision_loss)]
    pub fn coerce(self, value: FieldValue) -> Result<FieldValue, String> {
        match (self, value) {
            (ValueType::Text, FieldValue::Text(s)) => Ok(FieldValue::Text(s)),
            (ValueType::Integer, FieldValue::Integer(v)) => Ok(FieldValue::Integer(v)),
            (ValueType::Float, FieldValue::Float(v)) if v.is_finite() => Ok(FieldValue::Float(v)),
            (ValueType::Float, FieldValue::Integer(v)) => Ok(FieldValue::Float(v as f64)),
            (ValueType::Boolean, FieldValue::Boolean(v)) => Ok(FieldValue::Boolean(v)),
            (ValueType::Enum(_), FieldValue::Text(s) | FieldValue::Enum(s)) => self.parse(&s),
            (ty, other) => Err(format!("{other:?} does not fit a {ty:?} slot")),
        }
    }
}

/// Shape of one slot of a kind.
#[derive(Debug, Clone, Copy)]
pub enum SlotShape {
    /// Leaf element holding a scalar.
    Field {
        tag: &'static str,
        value: ValueType,
    },
    /// Leaf element holding an absolute path, `<TAG DEST="KIND">/a/b</TAG>`.
    Reference {
        tag: &'static str,
        target: KindConstraint,
        many: bool,
    },
    /// Contained entities. `wrapper` is the grouping element, `tag` overrides
    /// the element name of the child itself (role-named instance refs).
    Child {
        wrapper: Option<&'static str>,
        tag: Option<&'static str>,
        accepts: KindConstraint,
        many: bool,
    },
}

/// A named slot of a kind, in document order.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub name: &'static str,
    pub shape: SlotShape,
}

impl Slot {
    pub const fn field(name: &'static str, tag: &'static str, value: ValueType) -> Self {
        Self {
            name,
            shape: SlotShape::Field { tag, value },
        }
    }

    pub const fn reference(name: &'static str, tag: &'static str, target: KindConstraint) -> Self {
        Self {
            name,
            shape: SlotShape::Reference {
                tag,
                target,
                many: false,
            },
        }
    }

    pub const fn references(name: &'static str, tag: &'static str, target: KindConstraint) -> Self {
        Self {
            name,
            shape: SlotShape::Reference {
                tag,
                target,
                many: true,
            },
        }
    }

    /// Many-valued child slot grouped under `wrapper`.
    pub const fn children(
        name: &'static str,
        wrapper: &'static str,
        accepts: KindConstraint,
    ) -> Self {
        Self {
            name,
            shape: SlotShape::Child {
                wrapper: Some(wrapper),
                tag: None,
                accepts,
                many: true,
            },
        }
    }

    /// Single-valued child slot.
    pub const fn child(
        name: &'static str,
        wrapper: Option<&'static str>,
        tag: Option<&'static str>,
        accepts: KindConstraint,
    ) -> Self {
        Self {
            name,
            shape: SlotShape::Child {
                wrapper,
                tag,
                accepts,
                many: false,
            },
        }
    }

    pub fn is_many(&self) -> bool {
        match self.shape {
            SlotShape::Field { .. } => false,
            SlotShape::Reference { many, .. } | SlotShape::Child { many, .. } => many,
        }
    }
}

/// One row of the kind table.
#[derive(Debug)]
pub struct KindSpec {
    pub kind: EntityKind,
    pub tag: &'static str,
    /// Referrable kinds carry a short name and therefore a path.
    pub referrable: bool,
    /// Mergeable containers may be contributed to by several documents.
    pub mergeable: bool,
    pub classes: &'static [KindClass],
    pub slots: &'static [Slot],
}

/// Element name of the short name of referrable entities.
pub const SHORT_NAME_TAG: &str = "SHORT-NAME";
/// Attribute naming the target kind on reference elements.
pub const DEST_ATTRIBUTE: &str = "DEST";

/// Static knowledge about the format, queried by every engine component.
pub trait SchemaCatalog: Sync {
    fn spec(&self, kind: EntityKind) -> &'static KindSpec;

    fn kind_for_tag(&self, tag: &str) -> Option<EntityKind>;

    fn root_kind(&self) -> EntityKind;

    fn tag(&self, kind: EntityKind) -> &'static str {
        self.spec(kind).tag
    }

    fn is_referrable(&self, kind: EntityKind) -> bool {
        self.spec(kind).referrable
    }

    fn is_mergeable(&self, kind: EntityKind) -> bool {
        self.spec(kind).mergeable
    }

    fn slots(&self, kind: EntityKind) -> &'static [Slot] {
        self.spec(kind).slots
    }

    fn slot(&self, kind: EntityKind, name: &str) -> Option<(usize, &'static Slot)> {
        self.slots(kind)
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.name == name)
    }

    fn satisfies(&self, kind: EntityKind, constraint: KindConstraint) -> bool {
        match constraint {
            KindConstraint::Exactly(expected) => kind == expected,
            KindConstraint::Class(class) => self.spec(kind).classes.contains(&class),
        }
    }

    /// Whether any child slot of `parent` accepts `child`.
    fn allows_child(&self, parent: EntityKind, child: EntityKind) -> bool {
        self.slots(parent).iter().any(|slot| match slot.shape {
            SlotShape::Child { accepts, .. } => self.satisfies(child, accepts),
            _ => false,
        })
    }

    /// Element name that appears directly inside the parent for this slot.
    ///
    /// `None` only for an unwrapped child slot that accepts a whole class,
    /// which the shipped table never declares.
    fn outer_tag(&self, slot: &Slot) -> Option<&'static str> {
        match slot.shape {
            SlotShape::Field { tag, .. } | SlotShape::Reference { tag, .. } => Some(tag),
            SlotShape::Child {
                wrapper: Some(wrapper),
                ..
            } => Some(wrapper),
            SlotShape::Child { tag: Some(tag), .. } => Some(tag),
            SlotShape::Child {
                accepts: KindConstraint::Exactly(kind),
                ..
            } => Some(self.tag(kind)),
            SlotShape::Child { .. } => None,
        }
    }
}
