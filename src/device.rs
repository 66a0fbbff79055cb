//! StringLight device facade.
//!
//! [`StringLight`] is the public API of the driver. Each operation builds one
//! command, hands it to the [`Engine`] and interprets the payload. Validation
//! happens while the command is built, so an invalid argument never reaches
//! the transport.
//!
//! ## Colour and mode
//!
//! Whether a colour change also switches the strip to solid mode is a policy
//! choice, see [`ColorModePolicy`]. The default leaves the mode alone; call
//! [`StringLight::set_mode`] explicitly when a static colour is wanted.
//!
//! ## Sharing
//!
//! `StringLight` takes `&mut self` everywhere and has no internal locking. Use
//! [`SharedStringLight`] when several threads need the same device; it holds
//! the lock for a whole exchange, retries and reconnects included.

use crate::config::DriverConfig;
use crate::engine::{Connection, Engine, EngineSettings};
use crate::error::LightResult;
use crate::protocol::{
    decode_color, decode_flag, decode_mode, decode_speed, Command, Mode, Opcode, Rgb, Status,
};
use crate::transport::Connector;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// What `set_color` does to the animation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorModePolicy {
    /// Send only `SET_COLOR`; the mode is unchanged.
    #[default]
    Preserve,
    /// Send `SET_MODE solid` first, then `SET_COLOR`.
    ForceSolid,
}

/// Driver for one StringLight controller.
pub struct StringLight {
    engine: Engine,
    color_policy: ColorModePolicy,
}

impl StringLight {
    /// Open the controller described by `config` over a serial port.
    ///
    /// Uses `port.path` when set, otherwise the first port found by scanning
    /// `port.discovery`.
    #[cfg(feature = "serial")]
    pub fn open(config: &DriverConfig) -> LightResult<Self> {
        use crate::discovery::{first_port, resolve_port, DirectoryScan};
        use crate::transport::SerialConnector;

        let port_id = match config.port.path.as_deref() {
            Some(path) => resolve_port(path)?,
            None => first_port(&DirectoryScan::from(&config.port.discovery))?,
        };
        tracing::info!(port = %port_id, baud_rate = config.port.baud_rate, "Opening StringLight");

        Self::with_connector(
            Box::new(SerialConnector::new()),
            port_id,
            config.port.baud_rate,
            config.engine_settings(),
            config.protocol.color_mode_policy,
        )
    }

    /// Open the controller through an arbitrary connector.
    pub fn with_connector(
        connector: Box<dyn Connector>,
        port_id: impl Into<String>,
        baud_rate: u32,
        settings: EngineSettings,
        color_policy: ColorModePolicy,
    ) -> LightResult<Self> {
        let connection = Connection::open(connector, port_id, baud_rate)?;
        Ok(Self {
            engine: Engine::new(connection, settings),
            color_policy,
        })
    }

    /// Same as [`StringLight::with_connector`] but built from a loaded configuration.
    pub fn with_config(
        connector: Box<dyn Connector>,
        port_id: impl Into<String>,
        config: &DriverConfig,
    ) -> LightResult<Self> {
        Self::with_connector(
            connector,
            port_id,
            config.port.baud_rate,
            config.engine_settings(),
            config.protocol.color_mode_policy,
        )
    }

    /// The engine, for retry statistics and connection details.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Port this driver is bound to.
    pub fn port_id(&self) -> &str {
        self.engine.connection().port_id()
    }

    /// Active colour/mode policy.
    pub fn color_policy(&self) -> ColorModePolicy {
        self.color_policy
    }

    /// Close the serial link. The next operation reopens it.
    pub fn close(&mut self) {
        self.engine.close();
    }

    fn send(&mut self, opcode: Opcode, args: &[i32]) -> LightResult<Vec<u8>> {
        let command = Command::new(opcode, args)?;
        self.engine.send(&command)
    }

    /// Power the strip on.
    pub fn turn_on(&mut self) -> LightResult<()> {
        self.send(Opcode::On, &[])?;
        Ok(())
    }

    /// Power the strip off.
    pub fn turn_off(&mut self) -> LightResult<()> {
        self.send(Opcode::Off, &[])?;
        Ok(())
    }

    /// Set the strip colour.
    pub fn set_color(&mut self, r: u8, g: u8, b: u8) -> LightResult<()> {
        if self.color_policy == ColorModePolicy::ForceSolid {
            debug!("Switching to solid mode before colour change");
            self.set_mode(Mode::Solid)?;
        }
        self.send(Opcode::SetColor, &[r.into(), g.into(), b.into()])?;
        Ok(())
    }

    /// Set the animation mode.
    ///
    /// Takes a [`Mode`] or any raw byte. Raw values are not checked locally;
    /// the controller rejects the ones it does not know.
    pub fn set_mode(&mut self, mode: impl Into<u8>) -> LightResult<()> {
        let raw = mode.into();
        self.send(Opcode::SetMode, &[raw.into()])?;
        Ok(())
    }

    /// Set the animation speed. Values outside `0..=255` fail with
    /// [`crate::LightError::InvalidCommand`] before anything is written.
    pub fn set_speed(&mut self, speed: i32) -> LightResult<()> {
        self.send(Opcode::SetSpeed, &[speed])?;
        Ok(())
    }

    /// Enable or disable async animation.
    pub fn set_async(&mut self, enabled: bool) -> LightResult<()> {
        let flag = if enabled { Opcode::On } else { Opcode::Off };
        self.send(Opcode::SetAsync, &[flag.byte().into()])?;
        Ok(())
    }

    /// Read the full controller state.
    pub fn get_status(&mut self) -> LightResult<Status> {
        let payload = self.send(Opcode::GetStatus, &[])?;
        Status::decode(&payload)
    }

    /// Read the animation mode.
    pub fn get_mode(&mut self) -> LightResult<Mode> {
        decode_mode(&self.send(Opcode::GetMode, &[])?)
    }

    /// Read the strip colour.
    pub fn get_color(&mut self) -> LightResult<Rgb> {
        decode_color(&self.send(Opcode::GetColor, &[])?)
    }

    /// Whether the strip is powered.
    pub fn is_on(&mut self) -> LightResult<bool> {
        decode_flag(&self.send(Opcode::GetOnOff, &[])?)
    }

    /// Whether async animation is enabled.
    pub fn get_async(&mut self) -> LightResult<bool> {
        decode_flag(&self.send(Opcode::GetAsync, &[])?)
    }

    /// Read the animation speed.
    pub fn get_speed(&mut self) -> LightResult<u8> {
        decode_speed(&self.send(Opcode::GetSpeed, &[])?)
    }
}

/// Cloneable, thread-safe handle to one [`StringLight`].
///
/// Every call takes the lock for its whole duration, so commands from
/// different threads never interleave on the wire.
#[derive(Clone)]
pub struct SharedStringLight {
    inner: Arc<Mutex<StringLight>>,
}

impl SharedStringLight {
    /// Wrap a driver.
    pub fn new(light: StringLight) -> Self {
        Self {
            inner: Arc::new(Mutex::new(light)),
        }
    }

    /// Run several operations under one lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut StringLight) -> R) -> R {
        let mut light = self.inner.lock();
        f(&mut light)
    }

    /// See [`StringLight::turn_on`].
    pub fn turn_on(&self) -> LightResult<()> {
        self.with(StringLight::turn_on)
    }

    /// See [`StringLight::turn_off`].
    pub fn turn_off(&self) -> LightResult<()> {
        self.with(StringLight::turn_off)
    }

    /// See [`StringLight::set_color`].
    pub fn set_color(&self, r: u8, g: u8, b: u8) -> LightResult<()> {
        self.with(|light| light.set_color(r, g, b))
    }

    /// See [`StringLight::set_mode`].
    pub fn set_mode(&self, mode: impl Into<u8>) -> LightResult<()> {
        let raw = mode.into();
        self.with(|light| light.set_mode(raw))
    }

    /// See [`StringLight::set_speed`].
    pub fn set_speed(&self, speed: i32) -> LightResult<()> {
        self.with(|light| light.set_speed(speed))
    }

    /// See [`StringLight::set_async`].
    pub fn set_async(&self, enabled: bool) -> LightResult<()> {
        self.with(|light| light.set_async(enabled))
    }

    /// See [`StringLight::get_status`].
    pub fn get_status(&self) -> LightResult<Status> {
        self.with(StringLight::get_status)
    }
}

impl From<StringLight> for SharedStringLight {
    fn from(light: StringLight) -> Self {
        Self::new(light)
    }
}
