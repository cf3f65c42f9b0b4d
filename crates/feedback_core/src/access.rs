use crate::schema::{AdminIdentity, Report, Role};
use serde::Serialize;
use std::collections::BTreeSet;

/// One axis of a visibility scope: everything, or an explicit allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    All,
    Only(BTreeSet<String>),
}

impl Scope {
    /// An absent value never matches a concrete allow-list.
    pub fn admits(&self, value: Option<&str>) -> bool {
        match self {
            Scope::All => true,
            Scope::Only(allowed) => value.is_some_and(|value| allowed.contains(value)),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Scope::All)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibilityScope {
    pub districts: Scope,
    pub departments: Scope,
}

impl VisibilityScope {
    pub fn unrestricted() -> Self {
        Self {
            districts: Scope::All,
            departments: Scope::All,
        }
    }

    pub fn admits_district(&self, report: &Report) -> bool {
        self.districts.admits(report.district())
    }

    /// Unclassified reports have no known department yet and pass, unless
    /// the department list is empty, which admits nothing at all.
    pub fn admits_department(&self, report: &Report) -> bool {
        match (&self.departments, &report.ai) {
            (Scope::Only(allowed), _) if allowed.is_empty() => false,
            (_, None) => true,
            (departments, Some(ai)) => departments.admits(ai.category.as_deref()),
        }
    }

    pub fn admits(&self, report: &Report) -> bool {
        self.admits_district(report) && self.admits_department(report)
    }
}

/// Computes what an administrator may see.
///
/// A super admin sees everything. Any other identity is limited to its
/// assigned districts and, unless it holds the "All Categories" sentinel, its
/// departments. An empty assignment is a valid state that admits nothing.
pub fn resolve(identity: &AdminIdentity) -> VisibilityScope {
    if identity.role == Role::SuperAdmin {
        return VisibilityScope::unrestricted();
    }

    let departments = if identity.departments.is_unrestricted() {
        Scope::All
    } else {
        Scope::Only(identity.departments.as_set().clone())
    };

    VisibilityScope {
        districts: Scope::Only(identity.access.clone()),
        departments,
    }
}

/// Departments to pre-select when editing an identity: the ones it already
/// holds that appear among the offered options, in option order.
pub fn preselected_departments(identity: &AdminIdentity, options: &[String]) -> Vec<String> {
    options
        .iter()
        .filter(|option| identity.departments.contains(option))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Departments, ALL_CATEGORIES};

    #[test]
    fn super_admin_sees_everything() {
        let scope = resolve(&AdminIdentity::super_admin("root"));
        assert_eq!(scope, VisibilityScope::unrestricted());
    }

    #[test]
    fn super_admin_ignores_its_access_list() {
        let mut identity = AdminIdentity::super_admin("root");
        identity.access.insert("Chennai".to_string());
        identity.departments = Departments::from_legacy("Water");
        assert_eq!(resolve(&identity), VisibilityScope::unrestricted());
    }

    #[test]
    fn admin_is_limited_to_assignments() {
        let scope = resolve(&AdminIdentity::admin("a", ["Chennai"], ["Water", "Road"]));
        assert_eq!(scope.districts, Scope::Only(BTreeSet::from(["Chennai".to_string()])));
        assert!(scope.departments.admits(Some("Road")));
        assert!(!scope.departments.admits(Some("Health")));
    }

    #[test]
    fn all_categories_sentinel_lifts_department_limit() {
        let scope = resolve(&AdminIdentity::admin("a", ["Chennai"], [ALL_CATEGORIES]));
        assert!(scope.departments.is_all());
        assert!(!scope.districts.is_all());
    }

    #[test]
    fn empty_access_admits_nothing() {
        let identity = AdminIdentity::admin("a", Vec::<String>::new(), ["Water"]);
        let scope = resolve(&identity);
        assert!(!scope.districts.admits(Some("Chennai")));
        assert!(!scope.districts.admits(None));
    }

    #[test]
    fn empty_departments_admit_nothing() {
        let identity = AdminIdentity::admin("a", ["Chennai"], Vec::<String>::new());
        let scope = resolve(&identity);
        let pending = crate::fixtures::unclassified("r1", Some("Chennai"));
        assert!(scope.admits_district(&pending));
        assert!(!scope.admits_department(&pending));
        assert!(!scope.admits(&pending));
    }

    #[test]
    fn absent_value_only_matches_all() {
        assert!(Scope::All.admits(None));
        assert!(!Scope::Only(BTreeSet::from(["x".to_string()])).admits(None));
    }

    #[test]
    fn preselection_reads_legacy_string_departments() {
        let mut identity = AdminIdentity::admin("a", ["Chennai"], ["placeholder"]);
        identity.departments = Departments::from_legacy("Road");
        let options: Vec<String> = ["Water", "Road", "Health"].map(String::from).to_vec();
        assert_eq!(preselected_departments(&identity, &options), vec!["Road".to_string()]);
    }

    #[test]
    fn preselection_drops_custom_departments() {
        let identity = AdminIdentity::admin("a", ["Chennai"], ["Drainage", "Water"]);
        let options: Vec<String> = ["Water", "Road"].map(String::from).to_vec();
        assert_eq!(preselected_departments(&identity, &options), vec!["Water".to_string()]);
    }
}
