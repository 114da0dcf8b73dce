//! Entity catalogue
//!
//! Every backend record type is described once here: its endpoint, the
//! columns its list view shows, the fields its search covers, and the form
//! fields used to create or update it. The generic list and form views read
//! nothing else.

use clap::ValueEnum;

use crate::core::form::{CompositeSpec, FieldSpec, Rule};
use crate::table::SortDirection;

/// Backend-managed record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum EntityKind {
    Department,
    SubDepartment,
    Hospital,
    HospitalType,
    Instrument,
    Investigation,
    Role,
    Color,
    Report,
    SpecimenType,
    Patient,
    Billing,
}

impl EntityKind {
    pub const ALL: [EntityKind; 12] = [
        EntityKind::Department,
        EntityKind::SubDepartment,
        EntityKind::Hospital,
        EntityKind::HospitalType,
        EntityKind::Instrument,
        EntityKind::Investigation,
        EntityKind::Role,
        EntityKind::Color,
        EntityKind::Report,
        EntityKind::SpecimenType,
        EntityKind::Patient,
        EntityKind::Billing,
    ];

    /// Static configuration for this entity type
    pub fn config(self) -> &'static EntityConfig {
        match self {
            EntityKind::Department => &DEPARTMENT,
            EntityKind::SubDepartment => &SUB_DEPARTMENT,
            EntityKind::Hospital => &HOSPITAL,
            EntityKind::HospitalType => &HOSPITAL_TYPE,
            EntityKind::Instrument => &INSTRUMENT,
            EntityKind::Investigation => &INVESTIGATION,
            EntityKind::Role => &ROLE,
            EntityKind::Color => &COLOR,
            EntityKind::Report => &REPORT,
            EntityKind::SpecimenType => &SPECIMEN_TYPE,
            EntityKind::Patient => &PATIENT,
            EntityKind::Billing => &BILLING,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.config().slug)
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.config().slug == s || kind.config().name.eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown entity: {}", s))
    }
}

/// Where a display column takes its value from in a raw record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Top-level field rendered as text
    Field(&'static str),
    /// Nested object path, e.g. `department.dptname`
    Path(&'static [&'static str]),
    /// Boolean flag rendered as one of two literals
    Flag {
        field: &'static str,
        on: &'static str,
        off: &'static str,
    },
    /// Date or timestamp rendered as a local date
    Date(&'static str),
    /// Numeric field, sorted numerically
    Number(&'static str),
}

/// `isactive`-style flag rendered as "Active"/"Inactive"
pub const fn active_flag(field: &'static str) -> FieldSource {
    FieldSource::Flag {
        field,
        on: "Active",
        off: "Inactive",
    }
}

/// One column of a list view
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub source: FieldSource,
}

const fn col(key: &'static str, label: &'static str, source: FieldSource) -> ColumnSpec {
    ColumnSpec { key, label, source }
}

/// Static configuration for an entity type
#[derive(Debug)]
pub struct EntityConfig {
    pub kind: EntityKind,
    /// REST collection endpoint (e.g., "/department")
    pub endpoint: &'static str,
    /// Singular name for messages (e.g., "department")
    pub name: &'static str,
    /// Plural name for messages (e.g., "departments")
    pub name_plural: &'static str,
    /// Command-line and route identifier (e.g., "sub-department")
    pub slug: &'static str,
    /// List route segment (e.g., "departments")
    pub list_path: &'static str,
    pub columns: &'static [ColumnSpec],
    /// Display keys covered by the list search
    pub search_fields: &'static [&'static str],
    pub default_sort: (&'static str, SortDirection),
    pub fields: &'static [FieldSpec],
    /// Raw field used as the label when this entity fills a select input
    pub option_label: &'static str,
}

impl EntityConfig {
    /// Form field by input name
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Entities this form needs as select options, in field order without duplicates
    pub fn lookups(&self) -> Vec<EntityKind> {
        let mut kinds = Vec::new();
        for field in self.fields {
            if let Some(kind) = field.lookup() {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    /// Capitalized singular name for headings
    pub fn title(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// =========================================================================
// Master data
// =========================================================================

static DEPARTMENT: EntityConfig = EntityConfig {
    kind: EntityKind::Department,
    endpoint: "/department",
    name: "department",
    name_plural: "departments",
    slug: "department",
    list_path: "departments",
    columns: &[
        col("name", "Department", FieldSource::Field("dptname")),
        col("status", "Status", active_flag("isactive")),
        col("created", "Created On", FieldSource::Date("createdAt")),
    ],
    search_fields: &["name", "status"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("dptname", "Department name", "dptname")
            .required()
            .rules(&[Rule::Alphabetic]),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "dptname",
};

static SUB_DEPARTMENT: EntityConfig = EntityConfig {
    kind: EntityKind::SubDepartment,
    endpoint: "/subdepartment",
    name: "sub-department",
    name_plural: "sub-departments",
    slug: "sub-department",
    list_path: "sub-departments",
    columns: &[
        col("name", "Sub-department", FieldSource::Field("subdptname")),
        col("department", "Department", FieldSource::Path(&["department", "dptname"])),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "department", "status"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("subdptname", "Sub-department name", "subdptname").required(),
        FieldSpec::select("department", "Department", "department_id", EntityKind::Department)
            .required(),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "subdptname",
};

static HOSPITAL: EntityConfig = EntityConfig {
    kind: EntityKind::Hospital,
    endpoint: "/hospital",
    name: "hospital",
    name_plural: "hospitals",
    slug: "hospital",
    list_path: "hospitals",
    columns: &[
        col("name", "Hospital", FieldSource::Field("hospitalname")),
        col("type", "Type", FieldSource::Path(&["hospitalType", "hsptltype"])),
        col("city", "City", FieldSource::Field("city")),
        col("phone", "Phone", FieldSource::Field("phone")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "type", "city", "phone"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("hospitalname", "Hospital name", "hospitalname").required(),
        FieldSpec::select("hospitaltype", "Hospital type", "hospitaltype_id", EntityKind::HospitalType)
            .required(),
        FieldSpec::text("address", "Address", "address"),
        FieldSpec::text("city", "City", "city")
            .required()
            .rules(&[Rule::Alphabetic]),
        FieldSpec::text("state", "State", "state").rules(&[Rule::Alphabetic]),
        FieldSpec::text("pincode", "PIN code", "pincode").rules(&[Rule::PinCode]),
        FieldSpec::text("email", "Email", "email").rules(&[Rule::Email]),
        FieldSpec::text("phone", "Phone", "phone")
            .required()
            .rules(&[Rule::Mobile]),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "hospitalname",
};

static HOSPITAL_TYPE: EntityConfig = EntityConfig {
    kind: EntityKind::HospitalType,
    endpoint: "/hospitaltype",
    name: "hospital type",
    name_plural: "hospital types",
    slug: "hospital-type",
    list_path: "hospital-types",
    columns: &[
        col("name", "Hospital Type", FieldSource::Field("hsptltype")),
        col("description", "Description", FieldSource::Field("description")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "description"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("hsptltype", "Hospital type", "hsptltype").required(),
        FieldSpec::text("description", "Description", "description"),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "hsptltype",
};

static INSTRUMENT: EntityConfig = EntityConfig {
    kind: EntityKind::Instrument,
    endpoint: "/instrument",
    name: "instrument",
    name_plural: "instruments",
    slug: "instrument",
    list_path: "instruments",
    columns: &[
        col("name", "Instrument", FieldSource::Field("instrumentname")),
        col("make", "Make", FieldSource::Field("make")),
        col("department", "Department", FieldSource::Path(&["department", "dptname"])),
        col("installed", "Installed On", FieldSource::Date("installdate")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "make", "department"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("instrumentname", "Instrument name", "instrumentname").required(),
        FieldSpec::text("make", "Make", "make"),
        FieldSpec::text("shortcode", "Short code", "shortcode"),
        FieldSpec::date("installdate", "Install date", "installdate"),
        FieldSpec::select("department", "Department", "department_id", EntityKind::Department)
            .required(),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "instrumentname",
};

static TAT: CompositeSpec = CompositeSpec {
    parts: &["tat_hours", "tat_minutes"],
    template: "{tat_hours} hour {tat_minutes} min",
};

static INVESTIGATION: EntityConfig = EntityConfig {
    kind: EntityKind::Investigation,
    endpoint: "/investigation",
    name: "investigation",
    name_plural: "investigations",
    slug: "investigation",
    list_path: "investigations",
    columns: &[
        col("name", "Test Name", FieldSource::Field("testname")),
        col("code", "Code", FieldSource::Field("testcode")),
        col("department", "Department", FieldSource::Path(&["department", "dptname"])),
        col("price", "Price", FieldSource::Number("normalprice")),
        col("tat", "TAT", FieldSource::Field("tat")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "code", "department"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("testname", "Test name", "testname").required(),
        FieldSpec::text("testcode", "Test code", "testcode").required(),
        FieldSpec::text("shortcode", "Short code", "shortcode"),
        FieldSpec::select("department", "Department", "department_id", EntityKind::Department)
            .required(),
        FieldSpec::select(
            "subdepartment",
            "Sub-department",
            "subdepartment_id",
            EntityKind::SubDepartment,
        ),
        FieldSpec::select("specimen", "Specimen type", "specimen_id", EntityKind::SpecimenType)
            .required(),
        FieldSpec::select("instrument", "Instrument", "instrument_id", EntityKind::Instrument),
        FieldSpec::text("method", "Method", "method"),
        FieldSpec::decimal("normalprice", "Price", "normalprice").required(),
        FieldSpec::integer("tat_hours", "TAT hours").input_only(),
        FieldSpec::integer("tat_minutes", "TAT minutes").input_only(),
        FieldSpec::composite("tat", "Turnaround time", "tat", &TAT),
        FieldSpec::toggle("reportable", "Separately reportable", "reportable")
            .default_value("false"),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "testname",
};

static ROLE: EntityConfig = EntityConfig {
    kind: EntityKind::Role,
    endpoint: "/role",
    name: "role",
    name_plural: "roles",
    slug: "role",
    list_path: "roles",
    columns: &[
        col("name", "Role", FieldSource::Field("rolename")),
        col("description", "Description", FieldSource::Field("roledescription")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "description"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("rolename", "Role name", "rolename")
            .required()
            .rules(&[Rule::Alphabetic]),
        FieldSpec::text("roledescription", "Description", "roledescription"),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "rolename",
};

static COLOR: EntityConfig = EntityConfig {
    kind: EntityKind::Color,
    endpoint: "/color",
    name: "color",
    name_plural: "colors",
    slug: "color",
    list_path: "colors",
    columns: &[
        col("name", "Color", FieldSource::Field("colorname")),
        col("code", "Code", FieldSource::Field("colorcode")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "code"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("colorname", "Color name", "colorname")
            .required()
            .rules(&[Rule::Alphabetic]),
        FieldSpec::text("colorcode", "Color code", "colorcode").rules(&[Rule::HexColor]),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "colorname",
};

static REPORT: EntityConfig = EntityConfig {
    kind: EntityKind::Report,
    endpoint: "/report",
    name: "report",
    name_plural: "reports",
    slug: "report",
    list_path: "reports",
    columns: &[
        col("name", "Report", FieldSource::Field("reportname")),
        col("department", "Department", FieldSource::Path(&["department", "dptname"])),
        col("created", "Created On", FieldSource::Date("createdAt")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "department"],
    default_sort: ("created", SortDirection::Descending),
    fields: &[
        FieldSpec::text("reportname", "Report name", "reportname").required(),
        FieldSpec::select("department", "Department", "department_id", EntityKind::Department)
            .required(),
        FieldSpec::text("header", "Header text", "header"),
        FieldSpec::text("footer", "Footer text", "footer"),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "reportname",
};

static SPECIMEN_TYPE: EntityConfig = EntityConfig {
    kind: EntityKind::SpecimenType,
    endpoint: "/specimen",
    name: "specimen type",
    name_plural: "specimen types",
    slug: "specimen-type",
    list_path: "specimen-types",
    columns: &[
        col("name", "Specimen", FieldSource::Field("specimenname")),
        col("container", "Container Color", FieldSource::Path(&["color", "colorname"])),
        col("description", "Description", FieldSource::Field("description")),
        col("status", "Status", active_flag("isactive")),
    ],
    search_fields: &["name", "container", "description"],
    default_sort: ("name", SortDirection::Ascending),
    fields: &[
        FieldSpec::text("specimenname", "Specimen name", "specimenname").required(),
        FieldSpec::select("color", "Container color", "color_id", EntityKind::Color),
        FieldSpec::text("description", "Description", "description"),
        FieldSpec::toggle("isactive", "Active", "isactive").default_value("true"),
    ],
    option_label: "specimenname",
};

// =========================================================================
// Registration
// =========================================================================

static PATIENT: EntityConfig = EntityConfig {
    kind: EntityKind::Patient,
    endpoint: "/patient",
    name: "patient",
    name_plural: "patients",
    slug: "patient",
    list_path: "patients",
    columns: &[
        col("uhid", "UHID", FieldSource::Field("uhid")),
        col("first_name", "First Name", FieldSource::Field("firstname")),
        col("last_name", "Last Name", FieldSource::Field("lastname")),
        col("age", "Age", FieldSource::Number("age")),
        col("gender", "Gender", FieldSource::Field("gender")),
        col("mobile", "Mobile", FieldSource::Field("mobile")),
        col("registered", "Registered", FieldSource::Date("createdAt")),
    ],
    search_fields: &["uhid", "first_name", "last_name", "mobile"],
    default_sort: ("registered", SortDirection::Descending),
    fields: &[
        FieldSpec::text("firstname", "First name", "firstname")
            .required()
            .rules(&[Rule::Alphabetic]),
        FieldSpec::text("lastname", "Last name", "lastname").rules(&[Rule::Alphabetic]),
        FieldSpec::text("gender", "Gender", "gender").required(),
        FieldSpec::integer("age", "Age").api("age").required(),
        FieldSpec::text("mobile", "Mobile", "mobile")
            .required()
            .rules(&[Rule::Mobile]),
        FieldSpec::text("email", "Email", "email").rules(&[Rule::Email]),
        FieldSpec::text("address", "Address", "address"),
        FieldSpec::text("pincode", "PIN code", "pincode").rules(&[Rule::PinCode]),
        FieldSpec::select("hospital", "Referring hospital", "hospital_id", EntityKind::Hospital),
    ],
    option_label: "firstname",
};

static BILLING: EntityConfig = EntityConfig {
    kind: EntityKind::Billing,
    endpoint: "/billing",
    name: "bill",
    name_plural: "bills",
    slug: "billing",
    list_path: "billing",
    columns: &[
        col("bill_no", "Bill No", FieldSource::Field("billno")),
        col("patient", "Patient", FieldSource::Path(&["patient", "firstname"])),
        col("investigation", "Investigation", FieldSource::Path(&["investigation", "testname"])),
        col("amount", "Amount", FieldSource::Number("amount")),
        col("mode", "Payment Mode", FieldSource::Field("paymentmode")),
        col(
            "paid",
            "Payment",
            FieldSource::Flag {
                field: "ispaid",
                on: "Paid",
                off: "Pending",
            },
        ),
        col("date", "Bill Date", FieldSource::Date("billdate")),
    ],
    search_fields: &["bill_no", "patient", "investigation", "mode"],
    default_sort: ("date", SortDirection::Descending),
    fields: &[
        FieldSpec::integer("patient", "Patient id").api("patient_id").required(),
        FieldSpec::select(
            "investigation",
            "Investigation",
            "investigation_id",
            EntityKind::Investigation,
        )
        .required(),
        FieldSpec::decimal("amount", "Amount", "amount").required(),
        FieldSpec::decimal("discount", "Discount", "discount"),
        FieldSpec::text("paymentmode", "Payment mode", "paymentmode").required(),
        FieldSpec::toggle("ispaid", "Paid", "ispaid").default_value("false"),
    ],
    option_label: "billno",
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn test_every_kind_has_matching_config() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.config().kind, kind);
        }
    }

    #[test]
    fn test_slugs_are_unique_and_parse_back() {
        let mut seen = HashSet::new();
        for kind in EntityKind::ALL {
            let slug = kind.config().slug;
            assert!(seen.insert(slug), "duplicate slug {}", slug);
            assert_eq!(<EntityKind as FromStr>::from_str(slug).unwrap(), kind);
        }
        assert!(<EntityKind as FromStr>::from_str("spaceship").is_err());
    }

    #[test]
    fn test_search_and_sort_reference_columns() {
        for kind in EntityKind::ALL {
            let config = kind.config();
            let keys: Vec<_> = config.columns.iter().map(|c| c.key).collect();
            assert!(
                (2..=6).contains(&config.search_fields.len()),
                "{} has {} search fields",
                config.name,
                config.search_fields.len()
            );
            for field in config.search_fields {
                assert!(keys.contains(field), "{}: unknown search field {}", config.name, field);
            }
            assert!(keys.contains(&config.default_sort.0));
        }
    }

    #[test]
    fn test_composite_parts_exist() {
        for kind in EntityKind::ALL {
            let config = kind.config();
            for field in config.fields {
                if let crate::core::form::FieldKind::Composite(spec) = field.kind {
                    for part in spec.parts {
                        assert!(config.field(part).is_some(), "missing part {}", part);
                    }
                }
            }
        }
    }

    #[test]
    fn test_investigation_lookups() {
        assert_eq!(
            EntityKind::Investigation.config().lookups(),
            vec![
                EntityKind::Department,
                EntityKind::SubDepartment,
                EntityKind::SpecimenType,
                EntityKind::Instrument,
            ]
        );
        assert!(EntityKind::Role.config().lookups().is_empty());
    }

    #[test]
    fn test_title() {
        assert_eq!(EntityKind::HospitalType.config().title(), "Hospital type");
    }
}
