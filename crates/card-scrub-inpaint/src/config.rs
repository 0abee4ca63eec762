use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::InpaintError;
use crate::methods::{Inpainter, PhotoInpainter};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum InpaintMethod {
    #[default]
    Telea,
    NavierStokes,
}

impl InpaintMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            InpaintMethod::Telea => "telea",
            InpaintMethod::NavierStokes => "ns",
        }
    }

    pub fn available() -> Vec<InpaintMethod> {
        Configuration::available_methods()
    }
}

impl fmt::Display for InpaintMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct InpaintMethodParseError(pub String);

impl fmt::Display for InpaintMethodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown inpaint method '{}'", self.0)
    }
}

impl std::error::Error for InpaintMethodParseError {}

impl FromStr for InpaintMethod {
    type Err = InpaintMethodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "telea" => Ok(InpaintMethod::Telea),
            "ns" | "navier-stokes" | "navier_stokes" => Ok(InpaintMethod::NavierStokes),
            _ => Err(InpaintMethodParseError(lower)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub method: InpaintMethod,
    pub radius: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            method: InpaintMethod::Telea,
            radius: 3.0,
        }
    }
}

impl Configuration {
    pub fn available_methods() -> Vec<InpaintMethod> {
        vec![InpaintMethod::Telea, InpaintMethod::NavierStokes]
    }

    pub fn create_inpainter(&self) -> Result<Arc<dyn Inpainter>, InpaintError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(InpaintError::InvalidRadius(self.radius));
        }
        Ok(Arc::new(PhotoInpainter::new(self.method, self.radius)))
    }
}
