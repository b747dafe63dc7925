#[cfg(test)]
pub mod test {
    use chrono::TimeDelta;

    use crate::namespace::Namespace;
    use crate::option::OptionSpec;

    /// A small server schema with one nested namespace.
    ///
    /// Leaves, in order: `host`, `port`, `debug`, `database.url`,
    /// `database.pool_size`, `timeout`.
    pub fn server_schema() -> Namespace {
        let mut schema = Namespace::with_doc("Server settings");
        schema
            .add_option(
                OptionSpec::new("host")
                    .default_value("localhost")
                    .doc("Address to bind to"),
            )
            .unwrap();
        schema
            .add_option(
                OptionSpec::new("port")
                    .default_value(8080)
                    .doc("The port number")
                    .short_form('p'),
            )
            .unwrap();
        schema
            .add_option(
                OptionSpec::new("debug")
                    .default_value(false)
                    .doc("Enable debug mode")
                    .short_form('d'),
            )
            .unwrap();

        schema.namespace("database").unwrap().set_doc("Database settings");
        schema
            .add_option(
                OptionSpec::new("database.url")
                    .default_value("postgres://localhost")
                    .doc("Connection string URL"),
            )
            .unwrap();
        schema
            .add_option(OptionSpec::new("database.pool_size").default_value(5))
            .unwrap();

        schema
            .add_option(
                OptionSpec::new("timeout")
                    .default_value(TimeDelta::seconds(30))
                    .doc("Request timeout"),
            )
            .unwrap();
        schema
    }

    #[test]
    fn server_schema_defaults() {
        use crate::value::Value;

        let schema = server_schema();
        assert_eq!(schema.value("host"), Some(&Value::Text("localhost".into())));
        assert_eq!(schema.value("port"), Some(&Value::Int(8080)));
        assert_eq!(schema.value("debug"), Some(&Value::Bool(false)));
        assert_eq!(schema.value("database.pool_size"), Some(&Value::Int(5)));
        assert_eq!(
            schema.value("timeout"),
            Some(&Value::Duration(TimeDelta::seconds(30)))
        );
    }
}
