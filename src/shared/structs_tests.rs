/*
 * Unit tests for the shared data structures
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_request_new_valid
 * - test_request_new_rejects_idle
 * - test_request_new_rejects_inconsistent_destination
 * - test_request_ids_are_unique
 * - test_direction_deserialize
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod structs_tests {
    use crate::shared::{Direction, Request, RequestError};
    use serde::Deserialize;

    #[test]
    fn test_request_new_valid() {
        // Purpose: Verify that consistent requests are accepted and keep their fields

        // Act
        let up = Request::new(5, Direction::Up, 10).unwrap();
        let down = Request::new(6, Direction::Down, 1).unwrap();

        // Assert
        assert_eq!(up.floor(), 5);
        assert_eq!(up.direction(), Direction::Up);
        assert_eq!(up.destination_floor(), 10);
        assert_eq!(down.floor(), 6);
        assert_eq!(down.direction(), Direction::Down);
        assert_eq!(down.destination_floor(), 1);
        assert!(!up.id().is_empty());
    }

    #[test]
    fn test_request_new_rejects_idle() {
        // Purpose: Verify that an IDLE request fails at construction

        // Act
        let result = Request::new(3, Direction::Idle, 4);

        // Assert
        assert_eq!(result, Err(RequestError::IdleDirection));
    }

    #[test]
    fn test_request_new_rejects_inconsistent_destination() {
        // Purpose: Verify that the destination must lie in the requested direction

        // Act
        let down_above = Request::new(3, Direction::Down, 7);
        let down_same = Request::new(3, Direction::Down, 3);
        let up_below = Request::new(7, Direction::Up, 2);
        let up_same = Request::new(7, Direction::Up, 7);

        // Assert
        assert_eq!(
            down_above,
            Err(RequestError::DestinationNotBelow { floor: 3, destination: 7 })
        );
        assert_eq!(
            down_same,
            Err(RequestError::DestinationNotBelow { floor: 3, destination: 3 })
        );
        assert_eq!(
            up_below,
            Err(RequestError::DestinationNotAbove { floor: 7, destination: 2 })
        );
        assert_eq!(
            up_same,
            Err(RequestError::DestinationNotAbove { floor: 7, destination: 7 })
        );
    }

    #[test]
    fn test_request_ids_are_unique() {
        // Arrange
        let first = Request::new(1, Direction::Up, 2).unwrap();
        let second = Request::new(1, Direction::Up, 2).unwrap();

        // Assert
        assert_ne!(first.id(), second.id());
        assert_ne!(first, second);
        assert_eq!(first.clone(), first);
    }

    #[test]
    fn test_direction_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            direction: Direction,
        }

        // Act
        let up: Wrapper = toml::from_str("direction = \"up\"").unwrap();
        let down: Wrapper = toml::from_str("direction = \"down\"").unwrap();
        let bad = toml::from_str::<Wrapper>("direction = \"sideways\"");

        // Assert
        assert_eq!(up.direction, Direction::Up);
        assert_eq!(down.direction, Direction::Down);
        assert!(bad.is_err());
        assert_eq!(Direction::Idle.to_string(), "IDLE");
    }
}
