// Recommendation: the highest-rated player in a filtered pool.

use crate::player::Player;

/// Pick the highest-rated player from `pool`.
///
/// A missing rating counts as zero. Ties go to the earliest player in `pool`,
/// so callers pass pools in a fixed order (by player id) for reproducible
/// results. Returns `None` for an empty pool.
pub fn recommend(pool: &[Player]) -> Option<&Player> {
    let mut best: Option<&Player> = None;
    for player in pool {
        match best {
            Some(b) if player.effective_rating() <= b.effective_rating() => {}
            _ => best = Some(player),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Sex;

    fn rated(id: &str, rating: Option<f64>) -> Player {
        Player::new(id, format!("Golfer {id}"), Sex::Male, true, rating).unwrap()
    }

    #[test]
    fn empty_pool_has_no_recommendation() {
        assert!(recommend(&[]).is_none());
    }

    #[test]
    fn highest_rating_wins() {
        let pool = vec![rated("p1", Some(70.0)), rated("p2", Some(95.0)), rated("p3", Some(80.0))];
        assert_eq!(recommend(&pool).unwrap().id().as_str(), "p2");
    }

    #[test]
    fn ties_go_to_first_in_order() {
        let pool = vec![rated("p1", Some(90.0)), rated("p2", Some(90.0))];
        for _ in 0..10 {
            assert_eq!(recommend(&pool).unwrap().id().as_str(), "p1");
        }
    }

    #[test]
    fn missing_rating_counts_as_zero() {
        let pool = vec![rated("p1", None), rated("p2", Some(0.0)), rated("p3", Some(0.5))];
        assert_eq!(recommend(&pool).unwrap().id().as_str(), "p3");

        let unrated = vec![rated("p1", None), rated("p2", Some(0.0))];
        assert_eq!(recommend(&unrated).unwrap().id().as_str(), "p1");
    }
}
