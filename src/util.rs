const CIRC_CONFIG: &str = "CIRC_CONFIG";

const DEFAULT_CONFIG: &str = "config.toml";

pub fn get_config_path() -> String {
    std::env::var(CIRC_CONFIG).unwrap_or_else(|_| String::from(DEFAULT_CONFIG))
}

const CIRC_SENSOR_CLIENT_SECRET: &str = "CIRC_SENSOR_CLIENT_SECRET";

pub fn get_sensor_secret() -> Option<String> {
    std::env::var(CIRC_SENSOR_CLIENT_SECRET).ok()
}

const CIRC_DB_PASSWORD: &str = "CIRC_DB_PASSWORD";

pub fn get_db_password() -> Option<String> {
    std::env::var(CIRC_DB_PASSWORD).ok()
}
