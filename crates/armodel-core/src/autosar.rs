//! The AUTOSAR subset shipped with the engine.
//!
//! Slot order follows the element order of the AUTOSAR XML schema, which is
//! the order the writer falls back to for content a document did not lay
//! out itself.

use crate::catalog::{
    EntityKind, KindClass, KindConstraint, KindSpec, SchemaCatalog, Slot, ValueType,
};
use std::collections::HashMap;
use std::sync::LazyLock;

use EntityKind as K;
use KindClass as C;

const fn of(kind: EntityKind) -> KindConstraint {
    KindConstraint::Exactly(kind)
}

const fn class(class: KindClass) -> KindConstraint {
    KindConstraint::Class(class)
}

const TEXT: ValueType = ValueType::Text;
const INTEGER: ValueType = ValueType::Integer;
const FLOAT: ValueType = ValueType::Float;
const BOOLEAN: ValueType = ValueType::Boolean;

const CALIBRATION_ACCESS: ValueType =
    ValueType::Enum(&["NOT-ACCESSIBLE", "READ-ONLY", "READ-WRITE"]);
const ARGUMENT_DIRECTION: ValueType = ValueType::Enum(&["IN", "INOUT", "OUT"]);
const DATA_TYPE_POLICY: ValueType = ValueType::Enum(&[
    "LEGACY",
    "NETWORK-REPRESENTATION-FROM-COM-SPEC",
    "OVERRIDE",
    "PORT-INTERFACE-DEFINITION",
    "TRANSFORMING-I-SIGNAL",
]);
const I_SIGNAL_TYPE: ValueType = ValueType::Enum(&["ARRAY", "PRIMITIVE"]);

const CATEGORY: Slot = Slot::field("category", "CATEGORY", TEXT);
const SW_DATA_DEF_PROPS: Slot = Slot::child("sw_data_def_props", None, None, of(K::SwDataDefProps));

/// Row constructor; keeps the table below readable.
const fn row(
    kind: EntityKind,
    tag: &'static str,
    referrable: bool,
    classes: &'static [KindClass],
    slots: &'static [Slot],
) -> KindSpec {
    KindSpec {
        kind,
        tag,
        referrable,
        mergeable: false,
        classes,
        slots,
    }
}

const fn container(
    kind: EntityKind,
    tag: &'static str,
    referrable: bool,
    slots: &'static [Slot],
) -> KindSpec {
    KindSpec {
        kind,
        tag,
        referrable,
        mergeable: true,
        classes: &[],
        slots,
    }
}

/// Indexed by `EntityKind as usize`.
static SPECS: [KindSpec; 40] = [
    container(
        K::Autosar,
        "AUTOSAR",
        false,
        &[Slot::children("ar_packages", "AR-PACKAGES", of(K::ArPackage))],
    ),
    container(
        K::ArPackage,
        "AR-PACKAGE",
        true,
        &[
            CATEGORY,
            Slot::children("elements", "ELEMENTS", class(C::PackageableElement)),
            Slot::children("ar_packages", "AR-PACKAGES", of(K::ArPackage)),
        ],
    ),
    row(
        K::SwBaseType,
        "SW-BASE-TYPE",
        true,
        &[C::PackageableElement],
        &[
            CATEGORY,
            Slot::field("base_type_size", "BASE-TYPE-SIZE", INTEGER),
            Slot::field("base_type_encoding", "BASE-TYPE-ENCODING", TEXT),
            Slot::field("native_declaration", "NATIVE-DECLARATION", TEXT),
        ],
    ),
    row(
        K::ImplementationDataType,
        "IMPLEMENTATION-DATA-TYPE",
        true,
        &[C::PackageableElement, C::AutosarDataType],
        &[
            CATEGORY,
            SW_DATA_DEF_PROPS,
            Slot::children("sub_elements", "SUB-ELEMENTS", of(K::ImplementationDataTypeElement)),
        ],
    ),
    row(
        K::ImplementationDataTypeElement,
        "IMPLEMENTATION-DATA-TYPE-ELEMENT",
        true,
        &[],
        &[
            CATEGORY,
            Slot::field("array_size", "ARRAY-SIZE", INTEGER),
            SW_DATA_DEF_PROPS,
            Slot::children("sub_elements", "SUB-ELEMENTS", of(K::ImplementationDataTypeElement)),
        ],
    ),
    row(
        K::ApplicationPrimitiveDataType,
        "APPLICATION-PRIMITIVE-DATA-TYPE",
        true,
        &[C::PackageableElement, C::AutosarDataType],
        &[CATEGORY, SW_DATA_DEF_PROPS],
    ),
    row(
        K::SwDataDefProps,
        "SW-DATA-DEF-PROPS",
        false,
        &[],
        &[Slot::children(
            "variants",
            "SW-DATA-DEF-PROPS-VARIANTS",
            of(K::SwDataDefPropsConditional),
        )],
    ),
    row(
        K::SwDataDefPropsConditional,
        "SW-DATA-DEF-PROPS-CONDITIONAL",
        false,
        &[],
        &[
            Slot::reference("base_type", "BASE-TYPE-REF", of(K::SwBaseType)),
            Slot::field("sw_calibration_access", "SW-CALIBRATION-ACCESS", CALIBRATION_ACCESS),
            Slot::reference(
                "implementation_data_type",
                "IMPLEMENTATION-DATA-TYPE-REF",
                of(K::ImplementationDataType),
            ),
        ],
    ),
    row(
        K::SenderReceiverInterface,
        "SENDER-RECEIVER-INTERFACE",
        true,
        &[C::PackageableElement, C::PortInterface],
        &[
            Slot::field("is_service", "IS-SERVICE", BOOLEAN),
            Slot::children("data_elements", "DATA-ELEMENTS", of(K::VariableDataPrototype)),
        ],
    ),
    row(
        K::ClientServerInterface,
        "CLIENT-SERVER-INTERFACE",
        true,
        &[C::PackageableElement, C::PortInterface],
        &[
            Slot::field("is_service", "IS-SERVICE", BOOLEAN),
            Slot::children("operations", "OPERATIONS", of(K::ClientServerOperation)),
        ],
    ),
    row(
        K::VariableDataPrototype,
        "VARIABLE-DATA-PROTOTYPE",
        true,
        &[C::DataPrototype],
        &[
            SW_DATA_DEF_PROPS,
            Slot::reference("type", "TYPE-TREF", class(C::AutosarDataType)),
            Slot::child("init_value", Some("INIT-VALUE"), None, class(C::ValueSpecification)),
        ],
    ),
    row(
        K::ClientServerOperation,
        "CLIENT-SERVER-OPERATION",
        true,
        &[],
        &[Slot::children("arguments", "ARGUMENTS", of(K::ArgumentDataPrototype))],
    ),
    row(
        K::ArgumentDataPrototype,
        "ARGUMENT-DATA-PROTOTYPE",
        true,
        &[C::DataPrototype],
        &[
            Slot::reference("type", "TYPE-TREF", class(C::AutosarDataType)),
            Slot::field("direction", "DIRECTION", ARGUMENT_DIRECTION),
        ],
    ),
    row(
        K::NumericalValueSpecification,
        "NUMERICAL-VALUE-SPECIFICATION",
        false,
        &[C::ValueSpecification],
        &[
            Slot::field("short_label", "SHORT-LABEL", TEXT),
            Slot::field("value", "VALUE", FLOAT),
        ],
    ),
    row(
        K::TextValueSpecification,
        "TEXT-VALUE-SPECIFICATION",
        false,
        &[C::ValueSpecification],
        &[
            Slot::field("short_label", "SHORT-LABEL", TEXT),
            Slot::field("value", "VALUE", TEXT),
        ],
    ),
    row(
        K::ApplicationSwComponentType,
        "APPLICATION-SW-COMPONENT-TYPE",
        true,
        &[C::PackageableElement, C::SwComponentType],
        &[
            Slot::children("ports", "PORTS", class(C::PortPrototype)),
            Slot::children("internal_behaviors", "INTERNAL-BEHAVIORS", of(K::SwcInternalBehavior)),
        ],
    ),
    row(
        K::CompositionSwComponentType,
        "COMPOSITION-SW-COMPONENT-TYPE",
        true,
        &[C::PackageableElement, C::SwComponentType],
        &[
            Slot::children("ports", "PORTS", class(C::PortPrototype)),
            Slot::children("components", "COMPONENTS", of(K::SwComponentPrototype)),
            Slot::children("connectors", "CONNECTORS", of(K::AssemblySwConnector)),
        ],
    ),
    row(
        K::PPortPrototype,
        "P-PORT-PROTOTYPE",
        true,
        &[C::PortPrototype],
        &[Slot::reference(
            "provided_interface",
            "PROVIDED-INTERFACE-TREF",
            class(C::PortInterface),
        )],
    ),
    row(
        K::RPortPrototype,
        "R-PORT-PROTOTYPE",
        true,
        &[C::PortPrototype],
        &[Slot::reference(
            "required_interface",
            "REQUIRED-INTERFACE-TREF",
            class(C::PortInterface),
        )],
    ),
    row(
        K::SwcInternalBehavior,
        "SWC-INTERNAL-BEHAVIOR",
        true,
        &[],
        &[
            Slot::children("events", "EVENTS", class(C::RteEvent)),
            Slot::children("runnables", "RUNNABLES", of(K::RunnableEntity)),
        ],
    ),
    row(
        K::TimingEvent,
        "TIMING-EVENT",
        true,
        &[C::RteEvent],
        &[
            Slot::reference("start_on_event", "START-ON-EVENT-REF", of(K::RunnableEntity)),
            Slot::field("period", "PERIOD", FLOAT),
        ],
    ),
    row(
        K::DataReceivedEvent,
        "DATA-RECEIVED-EVENT",
        true,
        &[C::RteEvent],
        &[
            Slot::reference("start_on_event", "START-ON-EVENT-REF", of(K::RunnableEntity)),
            Slot::child("data", None, Some("DATA-IREF"), of(K::RVariableInAtomicSwcInstanceRef)),
        ],
    ),
    row(
        K::RVariableInAtomicSwcInstanceRef,
        "R-VARIABLE-IN-ATOMIC-SWC-INSTANCE-REF",
        false,
        &[],
        &[
            Slot::reference("context_r_port", "CONTEXT-R-PORT-REF", of(K::RPortPrototype)),
            Slot::reference(
                "target_data_element",
                "TARGET-DATA-ELEMENT-REF",
                of(K::VariableDataPrototype),
            ),
        ],
    ),
    row(
        K::RunnableEntity,
        "RUNNABLE-ENTITY",
        true,
        &[],
        &[
            Slot::field("can_be_invoked_concurrently", "CAN-BE-INVOKED-CONCURRENTLY", BOOLEAN),
            Slot::children(
                "data_receive_points",
                "DATA-RECEIVE-POINT-BY-ARGUMENTS",
                of(K::VariableAccess),
            ),
            Slot::children("data_send_points", "DATA-SEND-POINTS", of(K::VariableAccess)),
            Slot::field("symbol", "SYMBOL", TEXT),
        ],
    ),
    row(
        K::VariableAccess,
        "VARIABLE-ACCESS",
        true,
        &[],
        &[Slot::child(
            "accessed_variable",
            Some("ACCESSED-VARIABLE"),
            None,
            of(K::AutosarVariableRef),
        )],
    ),
    row(
        K::AutosarVariableRef,
        "AUTOSAR-VARIABLE-IREF",
        false,
        &[],
        &[
            Slot::reference("port_prototype", "PORT-PROTOTYPE-REF", class(C::PortPrototype)),
            Slot::reference(
                "target_data_prototype",
                "TARGET-DATA-PROTOTYPE-REF",
                class(C::DataPrototype),
            ),
        ],
    ),
    row(
        K::SwComponentPrototype,
        "SW-COMPONENT-PROTOTYPE",
        true,
        &[],
        &[Slot::reference("type", "TYPE-TREF", class(C::SwComponentType))],
    ),
    row(
        K::AssemblySwConnector,
        "ASSEMBLY-SW-CONNECTOR",
        true,
        &[],
        &[
            Slot::child(
                "provider",
                None,
                Some("PROVIDER-IREF"),
                of(K::PPortInCompositionInstanceRef),
            ),
            Slot::child(
                "requester",
                None,
                Some("REQUESTER-IREF"),
                of(K::RPortInCompositionInstanceRef),
            ),
        ],
    ),
    row(
        K::PPortInCompositionInstanceRef,
        "P-PORT-IN-COMPOSITION-INSTANCE-REF",
        false,
        &[],
        &[
            Slot::reference(
                "context_component",
                "CONTEXT-COMPONENT-REF",
                of(K::SwComponentPrototype),
            ),
            Slot::reference("target_p_port", "TARGET-P-PORT-REF", of(K::PPortPrototype)),
        ],
    ),
    row(
        K::RPortInCompositionInstanceRef,
        "R-PORT-IN-COMPOSITION-INSTANCE-REF",
        false,
        &[],
        &[
            Slot::reference(
                "context_component",
                "CONTEXT-COMPONENT-REF",
                of(K::SwComponentPrototype),
            ),
            Slot::reference("target_r_port", "TARGET-R-PORT-REF", of(K::RPortPrototype)),
        ],
    ),
    row(
        K::SystemSignal,
        "SYSTEM-SIGNAL",
        true,
        &[C::PackageableElement],
        &[Slot::field("dynamic_length", "DYNAMIC-LENGTH", BOOLEAN)],
    ),
    row(
        K::ISignal,
        "I-SIGNAL",
        true,
        &[C::PackageableElement],
        &[
            Slot::field("data_type_policy", "DATA-TYPE-POLICY", DATA_TYPE_POLICY),
            Slot::field("i_signal_type", "I-SIGNAL-TYPE", I_SIGNAL_TYPE),
            Slot::field("length", "LENGTH", INTEGER),
            Slot::reference("system_signal", "SYSTEM-SIGNAL-REF", of(K::SystemSignal)),
        ],
    ),
    row(
        K::EcuInstance,
        "ECU-INSTANCE",
        true,
        &[C::PackageableElement],
        &[
            CATEGORY,
            Slot::field("sleep_mode_supported", "SLEEP-MODE-SUPPORTED", BOOLEAN),
        ],
    ),
    row(
        K::System,
        "SYSTEM",
        true,
        &[C::PackageableElement],
        &[
            CATEGORY,
            Slot::children("mappings", "MAPPINGS", of(K::SystemMapping)),
            Slot::child(
                "root_software_composition",
                Some("ROOT-SOFTWARE-COMPOSITIONS"),
                None,
                of(K::RootSwCompositionPrototype),
            ),
        ],
    ),
    row(
        K::SystemMapping,
        "SYSTEM-MAPPING",
        true,
        &[],
        &[
            Slot::children("data_mappings", "DATA-MAPPINGS", of(K::SenderReceiverToSignalMapping)),
            Slot::children("sw_mappings", "SW-MAPPINGS", of(K::SwcToEcuMapping)),
        ],
    ),
    // No SHORT-NAME in the AUTOSAR schema, so created without a name.
    row(
        K::SenderReceiverToSignalMapping,
        "SENDER-RECEIVER-TO-SIGNAL-MAPPING",
        false,
        &[],
        &[
            Slot::child(
                "data_element",
                None,
                Some("DATA-ELEMENT-IREF"),
                of(K::VariableDataPrototypeInSystemInstanceRef),
            ),
            Slot::reference("system_signal", "SYSTEM-SIGNAL-REF", of(K::SystemSignal)),
        ],
    ),
    row(
        K::VariableDataPrototypeInSystemInstanceRef,
        "VARIABLE-DATA-PROTOTYPE-IN-SYSTEM-INSTANCE-REF",
        false,
        &[],
        &[
            Slot::references(
                "context_components",
                "CONTEXT-COMPONENT-REF",
                of(K::SwComponentPrototype),
            ),
            Slot::reference("context_port", "CONTEXT-PORT-REF", class(C::PortPrototype)),
            Slot::reference(
                "target_data_prototype",
                "TARGET-DATA-PROTOTYPE-REF",
                of(K::VariableDataPrototype),
            ),
        ],
    ),
    row(
        K::SwcToEcuMapping,
        "SWC-TO-ECU-MAPPING",
        true,
        &[],
        &[
            Slot::children("components", "COMPONENT-IREFS", of(K::ComponentInSystemInstanceRef)),
            Slot::reference("ecu_instance", "ECU-INSTANCE-REF", of(K::EcuInstance)),
        ],
    ),
    row(
        K::ComponentInSystemInstanceRef,
        "COMPONENT-IREF",
        false,
        &[],
        &[
            Slot::reference(
                "context_composition",
                "CONTEXT-COMPOSITION-REF",
                of(K::RootSwCompositionPrototype),
            ),
            Slot::references(
                "context_components",
                "CONTEXT-COMPONENT-REF",
                of(K::SwComponentPrototype),
            ),
            Slot::reference(
                "target_component",
                "TARGET-COMPONENT-REF",
                of(K::SwComponentPrototype),
            ),
        ],
    ),
    row(
        K::RootSwCompositionPrototype,
        "ROOT-SW-COMPOSITION-PROTOTYPE",
        true,
        &[],
        &[Slot::reference(
            "software_composition",
            "SOFTWARE-COMPOSITION-TREF",
            of(K::CompositionSwComponentType),
        )],
    ),
];

static TAGS: LazyLock<HashMap<&'static str, EntityKind>> =
    LazyLock::new(|| SPECS.iter().map(|spec| (spec.tag, spec.kind)).collect());

/// Catalog backed by the static AUTOSAR table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutosarCatalog;

/// Shared instance for sessions that do not bring their own catalog.
pub static AUTOSAR: AutosarCatalog = AutosarCatalog;

impl SchemaCatalog for AutosarCatalog {
    fn spec(&self, kind: EntityKind) -> &'static KindSpec {
        &SPECS[kind as usize]
    }

    fn kind_for_tag(&self, tag: &str) -> Option<EntityKind> {
        TAGS.get(tag).copied()
    }

    fn root_kind(&self) -> EntityKind {
        EntityKind::Autosar
    }
}
