use crate::models::{Bin, BinState, RobotState, RobotStatus};
use chrono::Utc;

/// Canned status for the book-retrieval robot. There is no hardware
/// integration; this is the fixed payload the admin dashboard renders.
pub fn status() -> RobotStatus {
    let bins = [
        ("A1", BinState::Available, 12),
        ("A2", BinState::Available, 15),
        ("B1", BinState::Retrieving, 8),
        ("B2", BinState::Available, 20),
        ("C1", BinState::Available, 10),
        ("C2", BinState::Available, 18),
        ("D1", BinState::Available, 14),
        ("D2", BinState::Available, 16),
    ]
    .iter()
    .enumerate()
    .map(|(index, (location, status, books_count))| Bin {
        id: index as u32 + 1,
        location: location.to_string(),
        status: *status,
        books_count: *books_count,
    })
    .collect();

    RobotStatus {
        status: RobotState::Idle,
        current_bin: None,
        target_bin: None,
        battery_level: 85,
        last_activity: Utc::now(),
        bins,
    }
}

#[cfg(test)]
mod test {
    use super::status;
    use crate::models::RobotState;

    #[test]
    fn test_canned_status_shape() {
        let robot = status();
        assert_eq!(robot.status, RobotState::Idle);
        assert_eq!(robot.bins.len(), 8);
        assert_eq!(robot.bins[2].location, "B1");
    }
}
