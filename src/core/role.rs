//! Roles and per-role applications
//!
//! Each role gets one application: the sidebar menu it sees and the entities
//! it may read or write. Commands check the route against the signed-in
//! role's application before doing any network work.

use clap::ValueEnum;
use thiserror::Error;

use crate::core::entity::EntityKind;
use crate::core::route::Route;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role '{0}'. Use admin, doctor, phlebotomist, receptionist, or technician")]
    Unknown(String),

    #[error("{route} is not available to the {role} role")]
    Forbidden { role: Role, route: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
pub enum Role {
    #[default]
    Admin,
    Doctor,
    Phlebotomist,
    Receptionist,
    Technician,
}

/// What a role may do with an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// One sidebar entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub route: Route,
}

use Access::{ReadOnly, ReadWrite};
use EntityKind as E;

const ADMIN_APP: &[(EntityKind, Access)] = &[
    (E::Department, ReadWrite),
    (E::SubDepartment, ReadWrite),
    (E::Hospital, ReadWrite),
    (E::HospitalType, ReadWrite),
    (E::Instrument, ReadWrite),
    (E::Investigation, ReadWrite),
    (E::Role, ReadWrite),
    (E::Color, ReadWrite),
    (E::Report, ReadWrite),
    (E::SpecimenType, ReadWrite),
    (E::Patient, ReadOnly),
    (E::Billing, ReadOnly),
];

const DOCTOR_APP: &[(EntityKind, Access)] = &[
    (E::Patient, ReadOnly),
    (E::Report, ReadOnly),
    (E::Investigation, ReadOnly),
];

const PHLEBOTOMIST_APP: &[(EntityKind, Access)] = &[
    (E::Patient, ReadOnly),
    (E::SpecimenType, ReadOnly),
    (E::Investigation, ReadOnly),
];

const RECEPTIONIST_APP: &[(EntityKind, Access)] = &[
    (E::Patient, ReadWrite),
    (E::Billing, ReadWrite),
    (E::Investigation, ReadOnly),
    (E::Hospital, ReadOnly),
];

const TECHNICIAN_APP: &[(EntityKind, Access)] = &[
    (E::Investigation, ReadWrite),
    (E::Instrument, ReadWrite),
    (E::Report, ReadWrite),
    (E::SpecimenType, ReadOnly),
    (E::Patient, ReadOnly),
];

impl Role {
    /// Application title shown above the menu
    pub fn app_name(self) -> &'static str {
        match self {
            Role::Admin => "Admin Console",
            Role::Doctor => "Doctor Desk",
            Role::Phlebotomist => "Sample Collection",
            Role::Receptionist => "Front Desk",
            Role::Technician => "Laboratory Bench",
        }
    }

    fn app(self) -> &'static [(EntityKind, Access)] {
        match self {
            Role::Admin => ADMIN_APP,
            Role::Doctor => DOCTOR_APP,
            Role::Phlebotomist => PHLEBOTOMIST_APP,
            Role::Receptionist => RECEPTIONIST_APP,
            Role::Technician => TECHNICIAN_APP,
        }
    }

    pub fn access(self, kind: EntityKind) -> Option<Access> {
        self.app()
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, access)| *access)
    }

    /// Sidebar entries: home, then one list per entity in the app
    pub fn menu(self) -> Vec<MenuItem> {
        let mut items = vec![MenuItem {
            label: "Dashboard".to_string(),
            route: Route::Home,
        }];
        items.extend(self.app().iter().map(|(kind, _)| {
            let config = kind.config();
            let mut chars = config.name_plural.chars();
            let label = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
            MenuItem {
                label,
                route: Route::List(*kind),
            }
        }));
        items
    }

    /// Reject routes outside this role's application
    pub fn guard(self, route: &Route) -> Result<(), RoleError> {
        let allowed = match route {
            Route::Home => true,
            Route::List(kind) | Route::Show(kind, _) => self.access(*kind).is_some(),
            Route::Add(kind) | Route::Update(kind, _) => {
                self.access(*kind) == Some(Access::ReadWrite)
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(RoleError::Forbidden {
                role: self,
                route: route.to_string(),
            })
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Doctor => write!(f, "doctor"),
            Role::Phlebotomist => write!(f, "phlebotomist"),
            Role::Receptionist => write!(f, "receptionist"),
            Role::Technician => write!(f, "technician"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "phlebotomist" => Ok(Role::Phlebotomist),
            "receptionist" | "reception" => Ok(Role::Receptionist),
            "technician" => Ok(Role::Technician),
            _ => Err(RoleError::Unknown(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("reception".parse::<Role>().unwrap(), Role::Receptionist);
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn test_menu_starts_with_dashboard() {
        let menu = Role::Receptionist.menu();
        assert_eq!(menu[0].route, Route::Home);
        assert_eq!(menu[1].label, "Patients");
        assert_eq!(menu[1].route.to_string(), "/patients");
        assert_eq!(menu.len(), RECEPTIONIST_APP.len() + 1);
    }

    #[test]
    fn test_guard_read_and_write() {
        let role = Role::Receptionist;
        assert!(role.guard(&Route::List(EntityKind::Patient)).is_ok());
        assert!(role.guard(&Route::Add(EntityKind::Patient)).is_ok());
        assert!(role.guard(&Route::List(EntityKind::Hospital)).is_ok());
        assert!(role.guard(&Route::Add(EntityKind::Hospital)).is_err());
        assert_eq!(
            role.guard(&Route::List(EntityKind::Instrument)),
            Err(RoleError::Forbidden {
                role: Role::Receptionist,
                route: "/instruments".to_string(),
            })
        );
    }

    #[test]
    fn test_admin_reaches_all_master_data() {
        for kind in EntityKind::ALL {
            assert!(Role::Admin.guard(&Route::List(kind)).is_ok());
        }
        assert!(Role::Admin.guard(&Route::Add(EntityKind::Billing)).is_err());
    }
}
