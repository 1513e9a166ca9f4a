//! Row types for the `opportunities` table.

use diesel::prelude::*;

use super::schema::opportunities;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = opportunities)]
pub struct NewOpportunityRow {
    pub t_detected: String,
    pub kind: String,
    pub payload_json: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = opportunities)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OpportunityRow {
    pub id: i32,
    pub t_detected: String,
    pub kind: String,
    pub payload_json: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_opportunity_row_is_insertable() {
        let _row = NewOpportunityRow {
            t_detected: "2026-08-01T00:00:00Z".to_string(),
            kind: "cross".to_string(),
            payload_json: "{}".to_string(),
        };
    }
}
