pub mod annotations;
pub mod ingredients;
pub mod recipes;
pub mod relations;
pub mod shopping_list;
pub mod subscriptions;
pub mod tags;
pub mod users;

pub use annotations::*;
pub use ingredients::*;
pub use recipes::*;
pub use relations::*;
pub use shopping_list::*;
pub use subscriptions::*;
pub use tags::*;
pub use users::*;

use std::collections::HashSet;

use crate::schema::Uuid;

/// Ids from `requested` that are absent from `found`, in request order.
pub(crate) fn missing_ids(requested: &[Uuid], found: &[Uuid]) -> Vec<Uuid> {
    let found: HashSet<Uuid> = found.iter().copied().collect();
    requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}

pub(crate) fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ids_keeps_request_order() {
        assert_eq!(missing_ids(&[5, 1, 9, 3], &[1, 3]), vec![5, 9]);
        assert!(missing_ids(&[1, 2], &[2, 1]).is_empty());
        assert!(missing_ids(&[], &[1]).is_empty());
    }

    #[test]
    fn ids_are_comma_joined() {
        assert_eq!(join_ids(&[4, 8]), "4, 8");
        assert_eq!(join_ids(&[]), "");
    }
}
