diesel::table! {
    post_cache (post_id) {
        post_id -> BigInt,
        status -> Text,
        title -> Text,
        owner -> Text,
        score -> BigInt,
        rating -> Text,
        width -> BigInt,
        height -> BigInt,
        file_type -> Text,
        tags -> Text,
        date_folder -> Text,
        timestamp -> Double,
        file_path -> Text,
        downloaded_at -> Text,
        created_at -> Text,
        file_size -> BigInt,
        duration -> Nullable<Double>,
    }
}
