//! Severity classification of sensor readings
//!
//! A reading is matched against a fixed, priority-ordered cascade of rules,
//! most dangerous first. The first rule that matches decides the outcome and
//! nothing after it is evaluated:
//!
//! 1. flame detected → CRÍTICO
//! 2. temperature above `temp_critical` → CRÍTICO
//! 3. gas above `gas_compound` together with vibration above `vib_high` → ALTO
//! 4. temperature above `temp_high` → ALTO
//! 5. gas above `gas_high` → ALTO
//! 6. temperature above `temp_medium` or gas above `gas_medium` → ATENÇÃO
//! 7. otherwise → NORMAL
//!
//! Every comparison is strict: a value equal to a boundary stays in the lower
//! tier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::reading::SensorReading;
use super::thresholds::DeviceConfig;

/// Severity level, ordered by increasing urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "ATENÇÃO")]
    Attention,
    #[serde(rename = "ALTO")]
    High,
    #[serde(rename = "CRÍTICO")]
    Critical,
}

impl AlertLevel {
    /// Wire name of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "NORMAL",
            AlertLevel::Attention => "ATENÇÃO",
            AlertLevel::High => "ALTO",
            AlertLevel::Critical => "CRÍTICO",
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, AlertLevel::Normal)
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(AlertLevel::Normal),
            "ATENÇÃO" => Ok(AlertLevel::Attention),
            "ALTO" => Ok(AlertLevel::High),
            "CRÍTICO" => Ok(AlertLevel::Critical),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown alert level '{0}'")]
pub struct UnknownLevel(pub String);

/// Outcome of classifying one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDescriptor {
    #[serde(rename = "nivel")]
    pub level: AlertLevel,
    #[serde(rename = "mensagem")]
    pub message: String,
    #[serde(rename = "causa")]
    pub cause: String,
    #[serde(rename = "acao")]
    pub action: String,
}

impl AlertDescriptor {
    fn new(
        level: AlertLevel,
        message: impl Into<String>,
        cause: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            cause: cause.into(),
            action: action.into(),
        }
    }
}

/// Classify a reading against a device's resolved thresholds
pub fn classify(reading: &SensorReading, config: &DeviceConfig) -> AlertDescriptor {
    if reading.flame_detected() {
        return AlertDescriptor::new(
            AlertLevel::Critical,
            "🔥 INCÊNDIO DETECTADO! Evacuação imediata!",
            "Sensor de chama ativado",
            "Acionar alarme, desligar equipamentos, chamar bombeiros",
        );
    }

    if reading.temperature > config.temp_critical {
        return AlertDescriptor::new(
            AlertLevel::Critical,
            "Temperatura crítica ultrapassada",
            format!(
                "Temperatura: {}°C (limite: {}°C)",
                reading.temperature, config.temp_critical
            ),
            "Parar processos, resfriar área",
        );
    }

    if reading.gas > config.gas_compound && reading.vibration > config.vib_high {
        return AlertDescriptor::new(
            AlertLevel::High,
            "Combinação perigosa: gás elevado + vibração anormal",
            "Possível vazamento próximo a equipamento vibrando",
            "Verificar vazamentos, desligar motores próximos",
        );
    }

    if reading.temperature > config.temp_high {
        return AlertDescriptor::new(
            AlertLevel::High,
            "Temperatura elevada detectada",
            format!("Temperatura: {}°C", reading.temperature),
            "Verificar resfriamento",
        );
    }

    if reading.gas > config.gas_high {
        return AlertDescriptor::new(
            AlertLevel::High,
            "Concentração de gás elevada",
            format!("Gás: {}ppm", reading.gas),
            "Verificar vazamentos, ventilar área",
        );
    }

    // Both values are cited even when only one crossed its boundary
    if reading.temperature > config.temp_medium || reading.gas > config.gas_medium {
        return AlertDescriptor::new(
            AlertLevel::Attention,
            "Parâmetros acima do normal",
            format!("Temp: {}°C, Gás: {}ppm", reading.temperature, reading.gas),
            "Monitorar de perto",
        );
    }

    AlertDescriptor::new(AlertLevel::Normal, "Sistema operando normalmente", "", "")
}
