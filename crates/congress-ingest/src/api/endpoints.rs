//! API endpoint path builders
//!
//! Paths are relative to the configured base URL; see
//! [`IngestConfig::endpoint_url`](crate::config::IngestConfig::endpoint_url).

use congress_common::{Chamber, CongressNumber, Identifier};

/// Build committee meeting listing path
pub fn committee_meetings_path(congress: CongressNumber, chamber: Chamber) -> String {
    format!("committee-meeting/{}/{}", congress, chamber)
}

/// Build committee meeting detail path
pub fn committee_meeting_details_path(
    congress: CongressNumber,
    chamber: Chamber,
    event_id: &Identifier,
) -> String {
    format!("committee-meeting/{}/{}/{}", congress, chamber, event_id)
}

/// Build committee listing path
pub fn committees_path(chamber: Chamber) -> String {
    format!("committee/{}", chamber)
}

/// Build committee detail path
pub fn committee_details_path(chamber: Chamber, system_code: &Identifier) -> String {
    format!("committee/{}/{}", chamber, system_code)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_committee_meetings_path() {
        let path = committee_meetings_path(CongressNumber::new(118).unwrap(), Chamber::Senate);
        assert_eq!(path, "committee-meeting/118/senate");
    }

    #[test]
    fn test_committee_meeting_details_path() {
        let path = committee_meeting_details_path(
            CongressNumber::default(),
            Chamber::NoChamber,
            &Identifier::from(115538),
        );
        assert_eq!(path, "committee-meeting/119/nochamber/115538");
    }

    #[test]
    fn test_committee_paths() {
        assert_eq!(committees_path(Chamber::House), "committee/house");
        assert_eq!(
            committee_details_path(Chamber::House, &Identifier::new("hsag00").unwrap()),
            "committee/house/hsag00"
        );
    }
}
