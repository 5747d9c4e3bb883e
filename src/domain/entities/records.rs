use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::mirror::MirrorRecord;

/// Construction project. The root aggregate the other collections hang off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obra {
    pub nombre: String,
    pub empresa_id: String,
    pub direccion: Option<String>,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    pub presupuesto: Option<f64>,
}

impl Obra {
    pub fn new(nombre: impl Into<String>, empresa_id: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            empresa_id: empresa_id.into(),
            direccion: None,
            fecha_inicio: None,
            fecha_fin: None,
            presupuesto: None,
        }
    }
}

impl MirrorRecord for Obra {
    const COLLECTION: &'static str = "obras";
}

/// Contract between an obra and a contratista.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contrato {
    pub obra_id: String,
    pub contratista_id: String,
    pub concepto: String,
    pub monto: f64,
    pub anticipo: Option<f64>,
    pub retencion: Option<f64>,
    pub fecha: Option<NaiveDate>,
}

impl Contrato {
    pub fn new(
        obra_id: impl Into<String>,
        contratista_id: impl Into<String>,
        concepto: impl Into<String>,
        monto: f64,
    ) -> Self {
        Self {
            obra_id: obra_id.into(),
            contratista_id: contratista_id.into(),
            concepto: concepto.into(),
            monto,
            anticipo: None,
            retencion: None,
            fecha: None,
        }
    }
}

impl MirrorRecord for Contrato {
    const COLLECTION: &'static str = "contratos";
}

/// Payment requisition against a contrato.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimacion {
    pub contrato_id: String,
    pub numero: u32,
    pub monto: f64,
    pub amortizacion: Option<f64>,
    pub retencion: Option<f64>,
    pub fecha: Option<NaiveDate>,
    pub folio: Option<String>,
}

impl Estimacion {
    pub fn new(contrato_id: impl Into<String>, numero: u32, monto: f64) -> Self {
        Self {
            contrato_id: contrato_id.into(),
            numero,
            monto,
            amortizacion: None,
            retencion: None,
            fecha: None,
            folio: None,
        }
    }
}

impl MirrorRecord for Estimacion {
    const COLLECTION: &'static str = "estimaciones";
}

/// Subcontractor. Carries an optional logo stored as an object key; the
/// usable URL is resolved at read time and never persisted to the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contratista {
    pub nombre: String,
    pub empresa_id: String,
    pub rfc: Option<String>,
    pub especialidad: Option<String>,
    pub telefono: Option<String>,
    pub correo: Option<String>,
    pub logo_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub logo_url: Option<String>,
}

impl Contratista {
    pub fn new(nombre: impl Into<String>, empresa_id: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            empresa_id: empresa_id.into(),
            rfc: None,
            especialidad: None,
            telefono: None,
            correo: None,
            logo_ref: None,
            logo_url: None,
        }
    }

    pub fn with_logo(mut self, logo_ref: impl Into<String>) -> Self {
        self.logo_ref = Some(logo_ref.into());
        self
    }
}

impl MirrorRecord for Contratista {
    const COLLECTION: &'static str = "contratistas";

    fn asset_refs(&self) -> Vec<String> {
        self.logo_ref.iter().cloned().collect()
    }

    fn apply_asset_url(&mut self, reference: &str, url: String) {
        if self.logo_ref.as_deref() == Some(reference) {
            self.logo_url = Some(url);
        }
    }
}
