//! Logical id allocation
//!
//! A resource's logical id is derived from its construct path inside the
//! stack: the path components with non-alphanumerics stripped, followed by
//! the first 8 hex digits of the SHA-256 of the full path. Ids are therefore
//! stable across runs and unique per path.

use aws_lc_rs::digest::{digest, SHA256};

/// Separator between construct path components
pub const PATH_SEPARATOR: &str = "/";

/// Number of hash bytes appended to a logical id (8 hex digits)
const HASH_BYTES: usize = 4;

/// Compute the logical id for a construct path (stack name excluded)
pub fn logical_id(path: &[&str]) -> String {
    let human: String = path
        .iter()
        .flat_map(|component| component.chars())
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    format!("{}{}", human, path_hash(path))
}

fn path_hash(path: &[&str]) -> String {
    let joined = path.join(PATH_SEPARATOR);
    let hash = digest(&SHA256, joined.as_bytes());
    hash.as_ref()
        .iter()
        .take(HASH_BYTES)
        .map(|b| format!("{:02X}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_id_is_stable() {
        assert_eq!(logical_id(&["VPC"]), logical_id(&["VPC"]));
    }

    #[test]
    fn logical_id_keeps_readable_prefix() {
        let id = logical_id(&["VPC", "publicSubnet1", "Subnet"]);
        assert!(id.starts_with("VPCpublicSubnet1Subnet"));
        assert_eq!(id.len(), "VPCpublicSubnet1Subnet".len() + 8);
        assert!(id[id.len() - 8..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn paths_with_same_letters_get_distinct_ids() {
        // "A/BC" and "AB/C" strip to the same prefix but hash differently
        assert_ne!(logical_id(&["A", "BC"]), logical_id(&["AB", "C"]));
    }

    #[test]
    fn non_alphanumerics_are_stripped() {
        let id = logical_id(&["nexus-data_volume"]);
        assert!(id.starts_with("nexusdatavolume"));
    }
}
