diesel::table! {
    opportunities (id) {
        id -> Integer,
        t_detected -> Text,
        kind -> Text,
        payload_json -> Text,
    }
}
