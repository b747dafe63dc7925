use layerfig::{LayerfigError, Namespace, OptionSpec};

/// Options the demo understands, grouped the way the config file nests them.
pub fn demo_schema() -> Result<Namespace, LayerfigError> {
    let mut schema = Namespace::with_doc("layerfig demo");

    schema.add_option(
        OptionSpec::new("name")
            .default_value("layerfig-demo")
            .doc("Display name of this instance"),
    )?;
    schema.add_option(
        OptionSpec::new("verbose")
            .default_value(false)
            .doc("Print extra detail")
            .short_form('v'),
    )?;
    schema.add_option(
        OptionSpec::new("write")
            .default_value("")
            .doc("Write the resolved config as json or toml instead of echoing it"),
    )?;

    schema.namespace("server")?.set_doc("Server settings");
    schema.add_option(
        OptionSpec::new("server.host")
            .default_value("127.0.0.1")
            .doc("Address to bind to"),
    )?;
    schema.add_option(
        OptionSpec::new("server.port")
            .default_value(8080)
            .doc("Port to listen on")
            .short_form('p'),
    )?;
    schema.add_option(
        OptionSpec::new("server.max_connections")
            .default_value(100)
            .doc("Maximum concurrent connections"),
    )?;

    schema.namespace("display")?.set_doc("Output settings");
    schema.add_option(
        OptionSpec::new("display.color")
            .default_value("yellow")
            .doc("Highlight color (red, green, yellow, blue, magenta, cyan)"),
    )?;
    schema.add_option(
        OptionSpec::new("display.format")
            .default_value("table")
            .doc("Output format: table or plain"),
    )?;

    Ok(schema)
}
