//! Person entity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityDescriptor, EntityId, EntityRef, FieldDef, entity};

pub(crate) static PERSON: EntityDescriptor = EntityDescriptor {
    name: "person",
    table: "person",
    path: "people",
    index: "person",
    fields: &[
        FieldDef::text("firstName", "first_name"),
        FieldDef::text("lastName", "last_name"),
        FieldDef::text("email", "email"),
        FieldDef::text("phoneNumber", "phone_number"),
        FieldDef::instant("hireDate", "hire_date"),
        FieldDef::integer("salary", "salary"),
        FieldDef::integer("commissionPct", "commission_pct"),
        FieldDef::many_to_one("manager", "manager_id", "person"),
        FieldDef::many_to_one("department", "department_id", "department"),
    ],
    joins: &[],
};

/// An employee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Store-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,

    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Hire date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<DateTime<Utc>>,

    /// Salary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,

    /// Commission percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_pct: Option<i64>,

    /// Manager, another person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<EntityRef>,

    /// Department the person works in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<EntityRef>,

    /// Inverse side of `Plate::person`. Never serialized.
    #[serde(skip)]
    pub plates: BTreeSet<EntityRef>,
}

entity!(Person, PERSON);

impl Person {
    /// Creates an unsaved person.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the given name.
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Sets the family name.
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the hire date.
    pub fn with_hire_date(mut self, hire_date: DateTime<Utc>) -> Self {
        self.hire_date = Some(hire_date);
        self
    }

    /// Sets the salary.
    pub fn with_salary(mut self, salary: i64) -> Self {
        self.salary = Some(salary);
        self
    }

    /// Sets the manager.
    pub fn with_manager(mut self, manager: impl Into<EntityRef>) -> Self {
        self.manager = Some(manager.into());
        self
    }

    /// Sets the department.
    pub fn with_department(mut self, department: impl Into<EntityRef>) -> Self {
        self.department = Some(department.into());
        self
    }
}
