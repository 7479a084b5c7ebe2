//! Discovery of the stage, group and agency columns.

use serde::Serialize;

/// Semantic role a column can play in the matrix
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Role {
    /// Sales-funnel status driving the engagement level
    Stage,
    /// Grouping used for series and the group filter
    Group,
    /// Record label used for points, heatmap columns and selection
    Agency,
}

/// Candidate predicates over normalized keys, in evaluation order
const ROLE_CANDIDATES: [(Role, fn(&str) -> bool); 3] = [
    (Role::Stage, |key| key.contains("stage") || key.contains("subscription")),
    (Role::Group, |key| key.contains("group")),
    (Role::Agency, |key| key.contains("agency") && key.contains("name")),
];

/// Column keys playing each role; each is the first matching column.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ColumnRoles {
    pub stage: Option<String>,
    pub group: Option<String>,
    pub agency: Option<String>,
}

impl ColumnRoles {
    /// Evaluates the candidate predicates against the keys, in column order
    pub fn discover<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keys: Vec<&str> = keys.into_iter().collect();
        let mut roles = ColumnRoles::default();
        for (role, predicate) in ROLE_CANDIDATES {
            let key = keys.iter().find(|key| predicate(key)).map(|key| key.to_string());
            match role {
                Role::Stage => roles.stage = key,
                Role::Group => roles.group = key,
                Role::Agency => roles.agency = key,
            }
        }
        roles
    }

    /// Key of the column playing `role`
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Stage => self.stage.as_deref(),
            Role::Group => self.group.as_deref(),
            Role::Agency => self.agency.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn discover_roles() {
        let roles = ColumnRoles::discover([
            "agency_type",
            "physician_group",
            "agency_name",
            "sales_stage_(subscription)",
            "group_id",
        ]);
        assert_eq!(roles, ColumnRoles {
            stage: Some("sales_stage_(subscription)".to_owned()),
            group: Some("physician_group".to_owned()),
            agency: Some("agency_name".to_owned()),
        });
        assert_eq!(roles.get(Role::Group), Some("physician_group"));
    }

    #[test]
    fn subscription_alone_is_a_stage() {
        let roles = ColumnRoles::discover(["subscription", "name"]);
        assert_eq!(roles.stage.as_deref(), Some("subscription"));
        assert_eq!(roles.agency, None);
        assert_eq!(roles.group, None);
    }

    #[test]
    fn agency_needs_both_words() {
        let roles = ColumnRoles::discover(["agency", "client_name"]);
        assert_eq!(roles.get(Role::Agency), None);
    }
}
