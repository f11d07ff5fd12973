//! Replica-set configuration and status documents

use std::collections::BTreeSet;
use std::fmt;

use mongodb::bson::{doc, Bson, Document};

use super::error::BootstrapError;

const GET_CONFIG: &str = "replSetGetConfig";
const GET_STATUS: &str = "replSetGetStatus";

/// One member of a replica-set configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: i32,
    pub host: String,
}

/// Replica-set configuration as sent to `replSetInitiate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSetConfig {
    pub name: String,
    pub members: Vec<Member>,
}

impl ReplicaSetConfig {
    /// Build a configuration from an unordered host list
    ///
    /// Hosts are sorted and deduplicated; each member's id is its position
    /// in that order, so the same host set always yields the same config.
    pub fn from_hosts(name: &str, hosts: &[String]) -> Result<Self, BootstrapError> {
        let sorted: BTreeSet<&str> = hosts
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect();
        if sorted.is_empty() {
            return Err(BootstrapError::NoHosts);
        }

        let members = sorted
            .into_iter()
            .zip(0..)
            .map(|(host, id)| Member {
                id,
                host: host.to_string(),
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            members,
        })
    }

    /// Host administrative commands are sent to
    pub fn contact_host(&self) -> &str {
        self.members
            .first()
            .map(|m| m.host.as_str())
            .unwrap_or_default()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn to_document(&self) -> Document {
        let members: Vec<Bson> = self
            .members
            .iter()
            .map(|m| Bson::Document(doc! { "_id": m.id, "host": m.host.as_str() }))
            .collect();
        doc! { "_id": self.name.as_str(), "members": members }
    }

    /// Parse the `config` document of a `replSetGetConfig` reply
    pub fn from_document(document: &Document) -> Result<Self, BootstrapError> {
        let malformed = |details: String| BootstrapError::MalformedReply {
            command: GET_CONFIG,
            details,
        };

        let name = document
            .get_str("_id")
            .map_err(|e| malformed(e.to_string()))?
            .to_string();
        let members = document
            .get_array("members")
            .map_err(|e| malformed(e.to_string()))?
            .iter()
            .map(|member| {
                let member = member
                    .as_document()
                    .ok_or_else(|| malformed("member is not a document".to_string()))?;
                let id = member
                    .get("_id")
                    .and_then(as_i32)
                    .ok_or_else(|| malformed("member without integer _id".to_string()))?;
                let host = member.get_str("host").map_err(|e| malformed(e.to_string()))?;
                Ok(Member {
                    id,
                    host: host.to_string(),
                })
            })
            .collect::<Result<Vec<_>, BootstrapError>>()?;

        Ok(Self { name, members })
    }
}

/// Role a member reports in `replSetGetStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Primary,
    Secondary,
    /// Any other state code (startup, recovering, down, ...)
    Other(i32),
}

impl MemberRole {
    pub fn from_state(state: i32) -> Self {
        match state {
            1 => MemberRole::Primary,
            2 => MemberRole::Secondary,
            other => MemberRole::Other(other),
        }
    }

    /// Primary or secondary
    pub fn is_serving(self) -> bool {
        matches!(self, MemberRole::Primary | MemberRole::Secondary)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemberRole::Primary => "PRIMARY",
            MemberRole::Secondary => "SECONDARY",
            MemberRole::Other(0) => "STARTUP",
            MemberRole::Other(3) => "RECOVERING",
            MemberRole::Other(5) => "STARTUP2",
            MemberRole::Other(7) => "ARBITER",
            MemberRole::Other(8) => "DOWN",
            MemberRole::Other(9) => "ROLLBACK",
            MemberRole::Other(10) => "REMOVED",
            MemberRole::Other(_) => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStatus {
    pub host: String,
    pub role: MemberRole,
}

/// Snapshot of member roles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSetStatus {
    pub members: Vec<MemberStatus>,
}

impl ReplicaSetStatus {
    /// Every known member is primary or secondary
    ///
    /// An empty member list never counts as converged.
    pub fn is_converged(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(|m| m.role.is_serving())
    }

    /// Parse a `replSetGetStatus` reply
    pub fn from_document(document: &Document) -> Result<Self, BootstrapError> {
        let malformed = |details: String| BootstrapError::MalformedReply {
            command: GET_STATUS,
            details,
        };

        let members = document
            .get_array("members")
            .map_err(|e| malformed(e.to_string()))?
            .iter()
            .map(|member| {
                let member = member
                    .as_document()
                    .ok_or_else(|| malformed("member is not a document".to_string()))?;
                let host = member.get_str("name").map_err(|e| malformed(e.to_string()))?;
                let state = member
                    .get("state")
                    .and_then(as_i32)
                    .ok_or_else(|| malformed(format!("member '{}' without state", host)))?;
                Ok(MemberStatus {
                    host: host.to_string(),
                    role: MemberRole::from_state(state),
                })
            })
            .collect::<Result<Vec<_>, BootstrapError>>()?;

        Ok(Self { members })
    }
}

impl fmt::Display for ReplicaSetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.members.is_empty() {
            return f.write_str("no members");
        }
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", member.host, member.role)?;
        }
        Ok(())
    }
}

fn as_i32(value: &Bson) -> Option<i32> {
    match value {
        Bson::Int32(v) => Some(*v),
        Bson::Int64(v) => i32::try_from(*v).ok(),
        Bson::Double(v) if v.fract() == 0.0 => i32::try_from(*v as i64).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_member_ids_follow_sorted_order() {
        let a = ReplicaSetConfig::from_hosts("rs0", &hosts(&["m3:27017", "m1:27017", "m2:27017"]))
            .unwrap();
        let b = ReplicaSetConfig::from_hosts(
            "rs0",
            &hosts(&["m2:27017", "m3:27017", "m1:27017", "m1:27017"]),
        )
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.member_count(), 3);
        assert_eq!(
            a.members[0],
            Member {
                id: 0,
                host: "m1:27017".to_string()
            }
        );
        assert_eq!(
            a.members[2],
            Member {
                id: 2,
                host: "m3:27017".to_string()
            }
        );
        assert_eq!(a.contact_host(), "m1:27017");
    }

    #[test]
    fn test_no_hosts() {
        assert!(matches!(
            ReplicaSetConfig::from_hosts("rs0", &hosts(&["", " "])),
            Err(BootstrapError::NoHosts)
        ));
    }

    #[test]
    fn test_config_document() {
        let config = ReplicaSetConfig::from_hosts("rs0", &hosts(&["m2", "m1"])).unwrap();
        let document = config.to_document();
        assert_eq!(document.get_str("_id").unwrap(), "rs0");
        assert_eq!(document.get_array("members").unwrap().len(), 2);

        // Server replies carry extra fields and may widen the ids
        let reply = doc! {
            "_id": "rs0",
            "version": 1,
            "members": [
                {"_id": 0_i64, "host": "m1", "priority": 1.0},
                {"_id": 1.0, "host": "m2", "priority": 1.0},
            ],
        };
        assert_eq!(ReplicaSetConfig::from_document(&reply).unwrap(), config);
    }

    #[test]
    fn test_malformed_config() {
        let reply = doc! { "_id": "rs0", "members": [{"host": "m1"}] };
        assert!(matches!(
            ReplicaSetConfig::from_document(&reply),
            Err(BootstrapError::MalformedReply {
                command: "replSetGetConfig",
                ..
            })
        ));
    }

    #[test]
    fn test_status_convergence() {
        let reply = doc! {
            "set": "rs0",
            "members": [
                {"_id": 0, "name": "m1:27017", "state": 1, "stateStr": "PRIMARY"},
                {"_id": 1, "name": "m2:27017", "state": 5, "stateStr": "STARTUP2"},
            ],
        };
        let status = ReplicaSetStatus::from_document(&reply).unwrap();
        assert!(!status.is_converged());
        assert_eq!(status.to_string(), "m1:27017=PRIMARY, m2:27017=STARTUP2");

        let reply = doc! {
            "members": [
                {"name": "m1:27017", "state": 1},
                {"name": "m2:27017", "state": 2},
            ],
        };
        let status = ReplicaSetStatus::from_document(&reply).unwrap();
        assert!(status.is_converged());
    }

    #[test]
    fn test_empty_status_is_not_converged() {
        let status = ReplicaSetStatus { members: vec![] };
        assert!(!status.is_converged());
        assert_eq!(status.to_string(), "no members");
    }
}
