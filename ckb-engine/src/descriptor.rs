//! Static plugin identity reported in info mode.
//!
//! Descriptors are plain data: build one in code or deserialize it from a
//! manifest (TOML, JSON, ...) with serde.

use ckb_transport::{Transport, TransportError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Capability flags ─────────────────────────────────────────────────

/// How the host reports key events to the plugin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPositionMode {
    None,
    Name,
    #[default]
    Position,
}

impl KeyPositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Name => "name",
            Self::Position => "position",
        }
    }
}

/// Unit of the host's `time` updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    #[default]
    Duration,
    Absolute,
}

impl TimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::Absolute => "absolute",
        }
    }
}

/// Whether parameters may change while running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamMode {
    Static,
    #[default]
    Live,
}

impl ParamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Live => "live",
        }
    }
}

/// Whether a new `start` may interrupt a running one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preempt {
    #[default]
    On,
    Off,
}

impl Preempt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

// ── Parameters and presets ───────────────────────────────────────────

/// Parameter widget types understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Long,
    Double,
    Bool,
    Rgb,
    Argb,
    Gradient,
    AGradient,
    Angle,
    String,
    Label,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Rgb => "rgb",
            Self::Argb => "argb",
            Self::Gradient => "gradient",
            Self::AGradient => "agradient",
            Self::Angle => "angle",
            Self::String => "string",
            Self::Label => "label",
        }
    }
}

/// One `param <kind> <name> <args...>` info line.
///
/// `args` are kind specific (prefix label, default, postfix, min, max) and
/// are sent as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ParamSpec {
    pub fn new<I, S>(kind: ParamKind, name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn fields(&self) -> Vec<&str> {
        let mut fields = vec!["param", self.kind.as_str(), self.name.as_str()];
        fields.extend(self.args.iter().map(String::as_str));
        fields
    }
}

/// Named bundle of default parameter values
///
/// Values keep the order they were declared in, which is the order the
/// host shows them. In a manifest they are written as on the wire:
/// `values = ["duration=2.0", "length=50.0"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(
        default,
        serialize_with = "serialize_pairs",
        deserialize_with = "deserialize_pairs"
    )]
    pub values: Vec<(String, String)>,
}

impl Preset {
    pub fn new<I, K, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value for parameter `name`, if the preset sets it.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `name=value` pairs as sent on the wire
    fn pairs(&self) -> Vec<String> {
        self.values.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

fn serialize_pairs<S: Serializer>(values: &[(String, String)], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(values.iter().map(|(k, v)| format!("{k}={v}")))
}

fn deserialize_pairs<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, String)>, D::Error> {
    Vec::<String>::deserialize(d)?
        .into_iter()
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => Ok((k.to_string(), v.to_string())),
            None => Err(serde::de::Error::custom(format!(
                "preset value {pair:?} is not name=value"
            ))),
        })
        .collect()
}

// ── Descriptor ───────────────────────────────────────────────────────

/// Everything the host learns about a plugin from `--ckb-info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationDescriptor {
    pub name: String,
    pub author: String,
    pub version: String,
    pub year: String,
    pub license: String,
    pub guid: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub presets: Vec<Preset>,
    pub kpmode: KeyPositionMode,
    pub time: TimeMode,
    pub parammode: ParamMode,
    pub preempt: Preempt,
}

impl Default for AnimationDescriptor {
    fn default() -> Self {
        Self {
            name: "<name>".to_string(),
            author: "<author>".to_string(),
            version: "0.01".to_string(),
            year: "2016".to_string(),
            license: "GPLv2".to_string(),
            guid: "{E0BBA19E-C328-4C0E-8E3C-A06D5722B4FB}".to_string(),
            description: "A generic animation plugin".to_string(),
            params: Vec::new(),
            presets: Vec::new(),
            kpmode: KeyPositionMode::default(),
            time: TimeMode::default(),
            parammode: ParamMode::default(),
            preempt: Preempt::default(),
        }
    }
}

impl AnimationDescriptor {
    /// Emit the info response, one command per line.
    pub fn write_info<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), TransportError> {
        transport.send_command(&["name", self.name.as_str()])?;
        transport.send_command(&["author", self.author.as_str()])?;
        transport.send_command(&["version", self.version.as_str()])?;
        transport.send_command(&["year", self.year.as_str()])?;
        transport.send_command(&["license", self.license.as_str()])?;
        transport.send_command(&["guid", self.guid.as_str()])?;
        transport.send_command(&["description", self.description.as_str()])?;

        for param in &self.params {
            transport.send_command(&param.fields())?;
        }

        transport.send_command(&["kpmode", self.kpmode.as_str()])?;
        transport.send_command(&["time", self.time.as_str()])?;
        transport.send_command(&["parammode", self.parammode.as_str()])?;
        transport.send_command(&["preempt", self.preempt.as_str()])?;

        for preset in &self.presets {
            let pairs = preset.pairs();
            let mut fields = vec!["preset", preset.name.as_str()];
            fields.extend(pairs.iter().map(String::as_str));
            transport.send_command(&fields)?;
        }

        Ok(())
    }
}
