//! Test suite scaffolding.
//!
//! Renders the skeleton of a test binary for a driver module: a fixture
//! holding one mock per selected bus plus the shared call counter, the
//! setup and teardown hooks, a set of placeholder tests with commented
//! example expectations, and a `main` running everything through
//! [`TestSuite`](crate::runner::TestSuite).

use std::{
    collections::BTreeSet,
    fmt::{self, Write as _},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::error::HarnessError;

/// Bus a module under test talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BusKind {
    /// I2C
    I2c,
    /// UART
    Uart,
    /// SPI
    Spi,
}

impl BusKind {
    /// All buses, in rendering order.
    pub const ALL: [BusKind; 3] = [BusKind::I2c, BusKind::Uart, BusKind::Spi];

    fn field(self) -> &'static str {
        match self {
            BusKind::I2c => "i2c",
            BusKind::Uart => "uart",
            BusKind::Spi => "spi",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            BusKind::I2c => "I2c",
            BusKind::Uart => "Uart",
            BusKind::Spi => "Spi",
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for BusKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "i2c" => Ok(BusKind::I2c),
            "uart" => Ok(BusKind::Uart),
            "spi" => Ok(BusKind::Spi),
            other => Err(HarnessError::InvalidArgument(format!(
                "unknown bus '{}', expected i2c, uart or spi",
                other
            ))),
        }
    }
}

/// Parse a comma separated bus list such as `i2c,spi`.
pub fn parse_bus_list(list: &str) -> Result<BTreeSet<BusKind>, HarnessError> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Check that `name` is a plain Rust identifier.
pub fn validate_module_name(name: &str) -> Result<(), HarnessError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid && name != "_" {
        Ok(())
    } else {
        Err(HarnessError::InvalidModuleName(name.to_string()))
    }
}

/// Scaffold options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaffoldConfig {
    /// Name of the module under test
    pub module: String,
    /// Buses the module uses
    pub buses: BTreeSet<BusKind>,
    /// Overwrite an existing file
    pub force: bool,
}

impl ScaffoldConfig {
    /// Options for `module` using every bus.
    pub fn new(module: impl Into<String>) -> Self {
        ScaffoldConfig {
            module: module.into(),
            buses: BusKind::ALL.into_iter().collect(),
            force: false,
        }
    }

    /// Restrict to the given buses.
    pub fn buses<I: IntoIterator<Item = BusKind>>(mut self, buses: I) -> Self {
        self.buses = buses.into_iter().collect();
        self
    }

    /// Allow overwriting an existing file.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Placeholder tests emitted into every skeleton.
const PLACEHOLDERS: [&str; 7] = [
    "init_success",
    "init_failure",
    "function1_success",
    "function2_success",
    "function3_error_handling",
    "write_error",
    "read_error",
];

/// A validated scaffold, ready to render.
#[derive(Clone, Debug)]
pub struct Scaffold {
    config: ScaffoldConfig,
}

impl Scaffold {
    /// Validate `config`.
    pub fn new(config: ScaffoldConfig) -> Result<Self, HarnessError> {
        validate_module_name(&config.module)?;
        if config.buses.is_empty() {
            return Err(HarnessError::NoBusSelected);
        }
        Ok(Scaffold { config })
    }

    /// File name of the rendered suite, `<module>_test.rs`.
    pub fn file_name(&self) -> String {
        format!("{}_test.rs", self.config.module)
    }

    /// Render the test suite source.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render_into(&mut out);
        out
    }

    /// Write the rendered suite into `dir` and return the file path.
    ///
    /// Fails with [`HarnessError::AlreadyExists`] if the file exists and
    /// `force` is not set.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, HarnessError> {
        let dir = dir.as_ref();
        let path = dir.join(self.file_name());
        if path.exists() && !self.config.force {
            return Err(HarnessError::AlreadyExists(path.display().to_string()));
        }
        fs::create_dir_all(dir)?;
        fs::write(&path, self.render())?;
        log::info!("wrote {}", path.display());
        Ok(path)
    }

    fn buses(&self) -> impl Iterator<Item = BusKind> + '_ {
        self.config.buses.iter().copied()
    }

    fn render_into(&self, out: &mut String) -> fmt::Result {
        let module = &self.config.module;

        writeln!(out, "//! Test suite for the `{}` module.", module)?;
        writeln!(out, "#![allow(unused_imports)]")?;
        writeln!(out)?;
        let ports: Vec<String> = self.buses().map(|b| format!("{}Port", b.prefix())).collect();
        writeln!(out, "use comms_mock::bus::{{Handle, {}}};", ports.join(", "))?;
        writeln!(out, "use comms_mock::counter::CallCounter;")?;
        writeln!(out, "use comms_mock::error::{{BusError, HarnessError}};")?;
        for bus in self.buses() {
            writeln!(
                out,
                "use comms_mock::{}::{{Mock as {p}Mock, Transaction as {p}Transaction}};",
                bus.field(),
                p = bus.prefix()
            )?;
        }
        writeln!(out, "use comms_mock::runner::{{skip, TestCase, TestSuite}};")?;
        writeln!(out)?;

        writeln!(out, "#[derive(Default)]")?;
        writeln!(out, "struct Fixture {{")?;
        writeln!(out, "    counter: CallCounter,")?;
        for bus in self.buses() {
            writeln!(out, "    {}: Option<{}Mock>,", bus.field(), bus.prefix())?;
        }
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(
            out,
            "fn global_setup(_fixture: &mut Fixture) -> Result<(), HarnessError> {{"
        )?;
        writeln!(out, "    Ok(())")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(
            out,
            "fn global_teardown(_fixture: &mut Fixture) -> Result<(), HarnessError> {{"
        )?;
        writeln!(out, "    Ok(())")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(
            out,
            "fn setup(fixture: &mut Fixture) -> Result<(), HarnessError> {{"
        )?;
        writeln!(out, "    fixture.counter.reset();")?;
        for bus in self.buses() {
            writeln!(
                out,
                "    fixture.{} = Some({}Mock::with_counter(&[], fixture.counter.clone()));",
                bus.field(),
                bus.prefix()
            )?;
        }
        writeln!(out, "    Ok(())")?;
        writeln!(out, "}}")?;
        writeln!(out)?;

        writeln!(
            out,
            "fn teardown(fixture: &mut Fixture) -> Result<(), HarnessError> {{"
        )?;
        for bus in self.buses() {
            writeln!(out, "    if let Some(mut mock) = fixture.{}.take() {{", bus.field())?;
            writeln!(out, "        mock.done();")?;
            writeln!(out, "    }}")?;
        }
        writeln!(out, "    Ok(())")?;
        writeln!(out, "}}")?;

        let first = self.buses().next().unwrap_or(BusKind::I2c);
        for name in PLACEHOLDERS {
            writeln!(out)?;
            writeln!(out, "fn test_{}(fixture: &mut Fixture) {{", name)?;
            writeln!(
                out,
                "    let {b} = fixture.{b}.as_mut().expect(\"fixture not set up\");",
                b = first.field()
            )?;
            for line in example(name, first, module) {
                writeln!(out, "    // {}", line)?;
            }
            writeln!(out, "    let _ = {};", first.field())?;
            writeln!(out, "    skip(\"not implemented\");")?;
            writeln!(out, "}}")?;
        }
        writeln!(out)?;

        writeln!(out, "fn main() {{")?;
        writeln!(out, "    if let Err(e) = comms_mock::logging::init() {{")?;
        writeln!(out, "        eprintln!(\"logger: {{}}\", e);")?;
        writeln!(out, "    }}")?;
        writeln!(out)?;
        writeln!(out, "    let result = TestSuite::new(\"{}\")", module)?;
        writeln!(out, "        .global_setup(global_setup)")?;
        writeln!(out, "        .global_teardown(global_teardown)")?;
        for name in PLACEHOLDERS {
            writeln!(
                out,
                "        .test(TestCase::new(\"{n}\", test_{n}).fixture(setup, teardown))",
                n = name
            )?;
        }
        writeln!(out, "        .run();")?;
        writeln!(out)?;
        writeln!(out, "    println!(\"{{}}\", result);")?;
        writeln!(out, "    std::process::exit(result.exit_code());")?;
        writeln!(out, "}}")
    }
}

/// Commented example body for placeholder `test` on `bus`.
fn example(test: &str, bus: BusKind, module: &str) -> Vec<String> {
    let b = bus.field();
    let p = bus.prefix();
    let open = match bus {
        BusKind::I2c => format!("{p}Transaction::open(\"/dev/i2c-1\", 0x48, 3)"),
        BusKind::Uart => format!("{p}Transaction::open(\"/dev/ttyS0\", 115_200, 3)"),
        BusKind::Spi => format!(
            "{p}Transaction::open(\"/dev/spidev0.0\", comms_mock::bus::SpiMode::Mode0, 1_000_000, 3)"
        ),
    };
    let write = match bus {
        BusKind::I2c => format!("{p}Transaction::write(0x01, vec![0xAA])"),
        BusKind::Uart => format!("{p}Transaction::write(vec![0xAA])"),
        BusKind::Spi => format!("{p}Transaction::transfer(vec![0xAA], vec![0x00])"),
    };
    let read = match bus {
        BusKind::I2c => format!("{p}Transaction::read(0x02, vec![0x12, 0x34])"),
        BusKind::Uart => format!("{p}Transaction::read_any(vec![0x12, 0x34])"),
        BusKind::Spi => format!("{p}Transaction::read(vec![0x12, 0x34])"),
    };
    let (write_fn, read_fn) = match bus {
        BusKind::I2c => ("i2c_write", "i2c_read"),
        BusKind::Uart => ("uart_write", "uart_read"),
        BusKind::Spi => ("spi_transfer", "spi_transfer"),
    };

    match test {
        "init_success" => vec![
            format!("{b}.update_expectations(&[{open}]);"),
            format!("assert!({module}::init({b}).is_ok());"),
            format!("assert!(fixture.counter.was_called(\"{b}_open\", 1));"),
        ],
        "init_failure" => vec![
            format!("{b}.update_expectations(&[{open}.with_error(BusError::DeviceNotFound(\"bus\".into()))]);"),
            format!("assert!({module}::init({b}).is_err());"),
        ],
        "function1_success" => vec![
            format!("{b}.update_expectations(&[{write}]);"),
            format!("assert!({module}::function1({b}, Handle(3)).is_ok());"),
            format!("assert!(fixture.counter.was_called(\"{write_fn}\", 1));"),
        ],
        "function2_success" => vec![
            format!("{b}.update_expectations(&[{read}]);"),
            format!("assert_eq!({module}::function2({b}, Handle(3)), Ok(0x1234));"),
            format!("assert!(fixture.counter.was_called(\"{read_fn}\", 1));"),
        ],
        "function3_error_handling" => vec![
            format!("{b}.update_expectations(&[{write}.returning(0)]);"),
            format!("assert!({module}::function3({b}, Handle(3)).is_err());"),
        ],
        "write_error" => vec![
            format!("{b}.update_expectations(&[{write}.with_error(BusError::Nack)]);"),
            format!("assert_eq!({module}::function1({b}, Handle(3)), Err(BusError::Nack));"),
        ],
        "read_error" => vec![
            format!("{b}.update_expectations(&[{read}.with_error(BusError::Timeout)]);"),
            format!("assert_eq!({module}::function2({b}, Handle(3)), Err(BusError::Timeout));"),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::plain("sensor", true)]
    #[case::underscore("_power_board", true)]
    #[case::digits("emag2", true)]
    #[case::empty("", false)]
    #[case::lone_underscore("_", false)]
    #[case::leading_digit("2emag", false)]
    #[case::dash("power-board", false)]
    #[case::space("power board", false)]
    fn module_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_module_name(name).is_ok(), valid);
    }

    #[test]
    fn bus_list() {
        let buses = parse_bus_list("spi, I2C,spi").unwrap();
        assert_eq!(buses.into_iter().collect::<Vec<_>>(), [BusKind::I2c, BusKind::Spi]);

        assert!(parse_bus_list("").unwrap().is_empty());
        assert!(matches!(
            parse_bus_list("i2c,can"),
            Err(HarnessError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(matches!(
            Scaffold::new(ScaffoldConfig::new("9lives")),
            Err(HarnessError::InvalidModuleName(_))
        ));
        assert!(matches!(
            Scaffold::new(ScaffoldConfig::new("emag").buses([])),
            Err(HarnessError::NoBusSelected)
        ));
    }

    #[test]
    fn renders_selected_buses_only() {
        let scaffold = Scaffold::new(ScaffoldConfig::new("emag").buses([BusKind::I2c])).unwrap();
        let source = scaffold.render();

        assert_eq!(scaffold.file_name(), "emag_test.rs");
        assert!(source.contains("use comms_mock::bus::{Handle, I2cPort};"));
        assert!(source.contains("    i2c: Option<I2cMock>,"));
        assert!(source.contains("I2cMock::with_counter(&[], fixture.counter.clone())"));
        assert!(!source.contains("UartMock"));
        assert!(!source.contains("SpiMock"));
        assert!(source.contains("TestSuite::new(\"emag\")"));
        assert!(source.contains("// assert!(emag::init(i2c).is_ok());"));
    }

    #[test]
    fn renders_every_placeholder() {
        let source = Scaffold::new(ScaffoldConfig::new("board")).unwrap().render();

        for name in PLACEHOLDERS {
            assert!(source.contains(&format!("fn test_{}(fixture: &mut Fixture)", name)));
            assert!(source.contains(&format!("TestCase::new(\"{n}\", test_{n})", n = name)));
        }
        assert!(source.contains("use comms_mock::bus::{Handle, I2cPort, UartPort, SpiPort};"));
        assert!(source.contains("std::process::exit(result.exit_code());"));
    }

    #[test]
    fn render_matches_checked_in_skeleton() {
        // demos/board_test.rs is built as a Cargo example, so this also
        // keeps the rendered source compiling.
        let source = Scaffold::new(ScaffoldConfig::new("board")).unwrap().render();
        assert_eq!(source, include_str!("../demos/board_test.rs"));
    }

    #[test]
    fn write_into_file_fails_with_io_error() {
        let file = std::env::temp_dir().join(format!("comms-mock-not-a-dir-{}", std::process::id()));
        fs::write(&file, b"").unwrap();

        let scaffold = Scaffold::new(ScaffoldConfig::new("emag")).unwrap();
        assert!(matches!(scaffold.write_to(&file), Err(HarnessError::Io(_))));

        fs::remove_file(&file).unwrap();
    }

    #[test]
    fn write_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("comms-mock-scaffold-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let scaffold = Scaffold::new(ScaffoldConfig::new("uart_bridge").buses([BusKind::Uart])).unwrap();
        let path = scaffold.write_to(&dir).unwrap();
        assert_eq!(path, dir.join("uart_bridge_test.rs"));
        assert_eq!(fs::read_to_string(&path).unwrap(), scaffold.render());

        assert!(matches!(
            scaffold.write_to(&dir),
            Err(HarnessError::AlreadyExists(_))
        ));

        let forced = Scaffold::new(
            ScaffoldConfig::new("uart_bridge")
                .buses([BusKind::Uart])
                .force(true),
        )
        .unwrap();
        assert!(forced.write_to(&dir).is_ok());

        fs::remove_dir_all(&dir).unwrap();
    }
}
