//! SIP account profiles
//!
//! A [`Profile`] is one user-configured SIP account: where to register,
//! which credentials to use and how to reach the registrar. Its `name` is the
//! profile identity, used both as the storage key and as the key handed to
//! the registration service.
//!
//! Field enumeration goes through an explicit table ([`FIELDS`]) rather than
//! naming conventions. The same table drives validation, display and
//! construction from raw editor values:
//!
//! ```rust
//! use rvoip_profile_core::profile::{Profile, ProfileField, Transport};
//!
//! let profile = Profile::from_fields([
//!     (ProfileField::Name, "alice"),
//!     (ProfileField::Domain, "sip.example.com"),
//!     (ProfileField::Username, "alice"),
//!     (ProfileField::Password, "secret"),
//!     (ProfileField::DisplayName, "Alice"),
//! ])
//! .unwrap();
//!
//! assert_eq!(profile.port, 5060);
//! assert_eq!(profile.transport, Transport::Udp);
//! assert_eq!(profile.field_value(ProfileField::Transport), "UDP");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// Default SIP port used when a profile does not name one
pub const DEFAULT_SIP_PORT: u16 = 5060;

/// Transport protocol used to reach the registrar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transport {
    #[default]
    Udp,
    Tcp,
    Tls,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Udp => write!(f, "UDP"),
            Transport::Tcp => write!(f, "TCP"),
            Transport::Tls => write!(f, "TLS"),
        }
    }
}

impl FromStr for Transport {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UDP" => Ok(Transport::Udp),
            "TCP" => Ok(Transport::Tcp),
            "TLS" => Ok(Transport::Tls),
            other => Err(ProfileError::invalid_field(
                ProfileField::Transport.key(),
                format!("unknown transport '{}'", other),
            )),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_SIP_PORT
}

fn default_auto_register() -> bool {
    true
}

/// A SIP account profile
///
/// Two profiles are equal when every field matches; identity alone is
/// compared through [`Profile::identity`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique profile name, also the identity
    pub name: String,
    /// SIP domain (registrar host)
    pub domain: String,
    /// Authentication username
    pub username: String,
    /// Authentication secret
    pub password: String,
    /// Name shown to remote parties
    pub display_name: String,
    /// Outbound proxy address, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_address: Option<String>,
    /// Registrar port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Transport protocol
    #[serde(default)]
    pub transport: Transport,
    /// Send keep-alive packets to hold NAT bindings open
    #[serde(default)]
    pub send_keep_alive: bool,
    /// Register automatically when the auto-register policy is on
    #[serde(default = "default_auto_register")]
    pub auto_register: bool,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .field("proxy_address", &self.proxy_address)
            .field("port", &self.port)
            .field("transport", &self.transport)
            .field("send_keep_alive", &self.send_keep_alive)
            .field("auto_register", &self.auto_register)
            .finish()
    }
}

impl Profile {
    /// Create a profile with default transport settings
    ///
    /// The display name starts out as the username.
    pub fn new(
        name: impl Into<String>,
        domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            name: name.into(),
            domain: domain.into(),
            display_name: username.clone(),
            username,
            password: password.into(),
            proxy_address: None,
            port: DEFAULT_SIP_PORT,
            transport: Transport::default(),
            send_keep_alive: false,
            auto_register: true,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the outbound proxy address
    pub fn with_proxy(mut self, proxy_address: impl Into<String>) -> Self {
        self.proxy_address = Some(proxy_address.into());
        self
    }

    /// Set the registrar port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the transport protocol
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Enable or disable keep-alive packets
    pub fn with_keep_alive(mut self, send_keep_alive: bool) -> Self {
        self.send_keep_alive = send_keep_alive;
        self
    }

    /// Enable or disable automatic registration
    pub fn with_auto_register(mut self, auto_register: bool) -> Self {
        self.auto_register = auto_register;
        self
    }

    /// The profile identity
    pub fn identity(&self) -> &str {
        &self.name
    }

    /// Address of record, `sip:username@domain`
    pub fn uri(&self) -> String {
        format!("sip:{}@{}", self.username, self.domain)
    }

    /// One-line description for list displays
    pub fn summary(&self) -> String {
        format!("{} <{}>", self.display_name, self.uri())
    }

    /// Check that every required field is filled in
    ///
    /// Fails on the first empty required field in table order, naming it.
    pub fn validate(&self) -> Result<()> {
        for spec in FIELDS.iter().filter(|spec| spec.required) {
            if (spec.get)(self).trim().is_empty() {
                return Err(ProfileError::empty_field(spec.key));
            }
        }
        if self.port == 0 {
            return Err(ProfileError::invalid_field(
                ProfileField::Port.key(),
                "must be between 1 and 65535",
            ));
        }
        Ok(())
    }

    /// Read a field as display text
    pub fn field_value(&self, field: ProfileField) -> String {
        (field.spec().get)(self)
    }

    /// Write a field from raw editor text
    pub fn set_field(&mut self, field: ProfileField, value: &str) -> Result<()> {
        (field.spec().set)(self, value)
    }

    /// Build a validated profile from raw editor values
    ///
    /// Fields not supplied keep their defaults (port 5060, UDP, no proxy).
    pub fn from_fields<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ProfileField, S)>,
        S: AsRef<str>,
    {
        let mut profile = Profile::new("", "", "", "");
        for (field, value) in values {
            profile.set_field(field, value.as_ref())?;
        }
        profile.validate()?;
        Ok(profile)
    }
}

/// Profile fields known to editors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Name,
    Domain,
    Username,
    Password,
    DisplayName,
    ProxyAddress,
    Port,
    Transport,
    SendKeepAlive,
    AutoRegister,
}

impl ProfileField {
    /// Table entry for this field
    pub fn spec(self) -> &'static FieldSpec {
        // FIELDS is declared in enum order
        &FIELDS[self as usize]
    }

    /// Stable key, as used in error messages and editor forms
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Whether the field must be non-empty
    pub fn is_required(self) -> bool {
        self.spec().required
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec().title)
    }
}

/// One row of the field table
pub struct FieldSpec {
    pub field: ProfileField,
    pub key: &'static str,
    pub title: &'static str,
    pub required: bool,
    get: fn(&Profile) -> String,
    set: fn(&mut Profile, &str) -> Result<()>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("field", &self.field)
            .field("key", &self.key)
            .field("required", &self.required)
            .finish()
    }
}

fn parse_bool(field: ProfileField, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(ProfileError::invalid_field(
            field.key(),
            format!("expected a boolean, got '{}'", other),
        )),
    }
}

/// Every profile field, in [`ProfileField`] order
pub static FIELDS: [FieldSpec; 10] = [
    FieldSpec {
        field: ProfileField::Name,
        key: "name",
        title: "Profile name",
        required: true,
        get: |p| p.name.clone(),
        set: |p, v| {
            p.name = v.trim().to_string();
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::Domain,
        key: "domain",
        title: "Domain",
        required: true,
        get: |p| p.domain.clone(),
        set: |p, v| {
            p.domain = v.trim().to_string();
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::Username,
        key: "username",
        title: "Username",
        required: true,
        get: |p| p.username.clone(),
        set: |p, v| {
            p.username = v.trim().to_string();
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::Password,
        key: "password",
        title: "Password",
        required: true,
        get: |p| p.password.clone(),
        set: |p, v| {
            // whitespace is significant in secrets
            p.password = v.to_string();
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::DisplayName,
        key: "display_name",
        title: "Display name",
        required: true,
        get: |p| p.display_name.clone(),
        set: |p, v| {
            p.display_name = v.trim().to_string();
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::ProxyAddress,
        key: "proxy_address",
        title: "Outbound proxy",
        required: false,
        get: |p| p.proxy_address.clone().unwrap_or_default(),
        set: |p, v| {
            let v = v.trim();
            p.proxy_address = if v.is_empty() { None } else { Some(v.to_string()) };
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::Port,
        key: "port",
        title: "Port number",
        required: true,
        get: |p| p.port.to_string(),
        set: |p, v| {
            let v = v.trim();
            if v.is_empty() {
                p.port = DEFAULT_SIP_PORT;
                return Ok(());
            }
            p.port = v
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| {
                    ProfileError::invalid_field("port", format!("'{}' is not a valid port", v))
                })?;
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::Transport,
        key: "transport",
        title: "Transport type",
        required: true,
        get: |p| p.transport.to_string(),
        set: |p, v| {
            p.transport = if v.trim().is_empty() {
                Transport::default()
            } else {
                v.parse()?
            };
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::SendKeepAlive,
        key: "send_keep_alive",
        title: "Send keep-alive",
        required: true,
        get: |p| p.send_keep_alive.to_string(),
        set: |p, v| {
            p.send_keep_alive = parse_bool(ProfileField::SendKeepAlive, v)?;
            Ok(())
        },
    },
    FieldSpec {
        field: ProfileField::AutoRegister,
        key: "auto_register",
        title: "Auto registration",
        required: true,
        get: |p| p.auto_register.to_string(),
        set: |p, v| {
            p.auto_register = parse_bool(ProfileField::AutoRegister, v)?;
            Ok(())
        },
    },
];
