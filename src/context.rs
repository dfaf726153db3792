//! Document contexts – the read-only data the host application hands us.
//!
//! Every entity deserializes from the JSON the host produces. Fields a
//! template may have to null-guard are `Option`; collections default to
//! empty. Amounts arrive pre-rounded to two decimals and dates as
//! `YYYY-MM-DD`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::documents::DocumentKind;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Display text that hosts may send as a JSON string or a bare number
/// (`"floor": 5`, `"bedrooms": "2"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(|v| match v {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Int(n) => n.to_string(),
        TextOrNumber::Float(f) => f.to_string(),
        TextOrNumber::Bool(b) => b.to_string(),
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Building {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub project_name: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub plot_no: Option<String>,
    /// Absolute path of the building render, embedded into appendices.
    pub image_path: Option<String>,
    pub completion_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    #[serde(deserialize_with = "text_or_number")]
    pub unit_no: Option<String>,
    pub unit_type: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub floor: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub bedrooms: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub view: Option<String>,
    /// Areas in square feet.
    pub suite_area: Option<f64>,
    pub balcony_area: Option<f64>,
    pub total_area: Option<f64>,
    pub parking_spaces: Option<u32>,
    pub price: Option<f64>,
    /// Absolute path of the floor plan image.
    pub floor_plan_path: Option<String>,
    pub building: Option<Building>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub nationality: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub passport_no: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub emirates_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Installment {
    pub description: Option<String>,
    /// Construction milestone that triggers the payment, when not date-bound.
    pub milestone: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub percentage: Option<f64>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentPlan {
    pub name: Option<String>,
    pub dld_fee_percentage: Option<f64>,
    pub admin_fee: Option<f64>,
    pub installments: Vec<Installment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Booking {
    #[serde(deserialize_with = "text_or_number")]
    pub reference: Option<String>,
    pub booking_date: Option<NaiveDate>,
    pub unit: Option<Unit>,
    /// Joint purchasers, in signing order.
    pub customers: Vec<CustomerInfo>,
    pub payment_plan: Option<PaymentPlan>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub amount_paid: Option<f64>,
    pub sales_agent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesOffer {
    #[serde(deserialize_with = "text_or_number")]
    pub reference: Option<String>,
    pub offer_date: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub unit: Option<Unit>,
    pub customer: Option<CustomerInfo>,
    pub original_price: Option<f64>,
    pub discount: Option<f64>,
    pub payment_plan: Option<PaymentPlan>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Broker {
    pub company_name: Option<String>,
    pub company_name_ar: Option<String>,
    /// RERA office registration number.
    #[serde(deserialize_with = "text_or_number")]
    pub orn_no: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub trade_license_no: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub commission_percentage: Option<f64>,
}

/// The seller. Identical on every document, so it comes from configuration
/// rather than from the per-document context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Developer {
    pub name: String,
    pub name_ar: Option<String>,
    pub address: Option<String>,
    pub trade_license_no: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_path: Option<String>,
}

impl Default for Developer {
    fn default() -> Self {
        Self {
            name: "The Developer".to_string(),
            name_ar: Some("المطور".to_string()),
            address: None,
            trade_license_no: None,
            phone: None,
            email: None,
            logo_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-document contexts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerAgreementContext {
    pub broker: Option<Broker>,
    pub project: Option<Building>,
    pub agreement_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationContext {
    pub booking: Option<Booking>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesOfferContext {
    pub sales_offer: Option<SalesOffer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaContext {
    pub booking: Option<Booking>,
}

/// The input of a single render call.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContext {
    BrokerAgreement(BrokerAgreementContext),
    ReservationForm(ReservationContext),
    SalesOffer(SalesOfferContext),
    SalesPurchaseAgreement(SpaContext),
}

impl DocumentContext {
    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentContext::BrokerAgreement(_) => DocumentKind::BrokerAgreement,
            DocumentContext::ReservationForm(_) => DocumentKind::ReservationForm,
            DocumentContext::SalesOffer(_) => DocumentKind::SalesOffer,
            DocumentContext::SalesPurchaseAgreement(_) => DocumentKind::SalesPurchaseAgreement,
        }
    }

    /// Deserialize the JSON context for `kind`.
    pub fn from_json(kind: DocumentKind, json: &str) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            DocumentKind::BrokerAgreement => {
                DocumentContext::BrokerAgreement(serde_json::from_str(json)?)
            }
            DocumentKind::ReservationForm => {
                DocumentContext::ReservationForm(serde_json::from_str(json)?)
            }
            DocumentKind::SalesOffer => DocumentContext::SalesOffer(serde_json::from_str(json)?),
            DocumentKind::SalesPurchaseAgreement => {
                DocumentContext::SalesPurchaseAgreement(serde_json::from_str(json)?)
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Sums over an installment schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InstallmentTotals {
    pub count: usize,
    pub amount: f64,
    pub percentage: f64,
}

impl PaymentPlan {
    pub fn totals(&self) -> InstallmentTotals {
        self.installments
            .iter()
            .fold(InstallmentTotals::default(), |acc, i| InstallmentTotals {
                count: acc.count + 1,
                amount: round2(acc.amount + i.amount.unwrap_or(0.0)),
                percentage: round2(acc.percentage + i.percentage.unwrap_or(0.0)),
            })
    }
}

/// Price after discount and the fees computed from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceSummary {
    pub gross: f64,
    /// Zero when no discount applies; templates omit the line then.
    pub discount: f64,
    pub net: f64,
    pub dld_fee: Option<f64>,
    pub admin_fee: Option<f64>,
    pub paid: Option<f64>,
    pub balance: Option<f64>,
}

impl PriceSummary {
    pub fn new(gross: f64, discount: Option<f64>, plan: Option<&PaymentPlan>) -> Self {
        let discount = discount.filter(|d| *d > 0.0).unwrap_or(0.0);
        let net = round2((gross - discount).max(0.0));
        let dld_fee = plan
            .and_then(|p| p.dld_fee_percentage)
            .map(|pct| round2(net * pct / 100.0));
        Self {
            gross,
            discount,
            net,
            dld_fee,
            admin_fee: plan.and_then(|p| p.admin_fee),
            paid: None,
            balance: None,
        }
    }
}

impl Booking {
    /// Booking price, falling back to the unit's list price.
    pub fn gross_price(&self) -> Option<f64> {
        self.price
            .or_else(|| self.unit.as_ref().and_then(|u| u.price))
    }

    pub fn price_summary(&self) -> Option<PriceSummary> {
        let gross = self.gross_price()?;
        let mut summary = PriceSummary::new(gross, self.discount, self.payment_plan.as_ref());
        summary.paid = self.amount_paid;
        summary.balance = self
            .amount_paid
            .map(|paid| round2((summary.net - paid).max(0.0)));
        Some(summary)
    }
}

impl SalesOffer {
    pub fn price_summary(&self) -> Option<PriceSummary> {
        let gross = self
            .original_price
            .or_else(|| self.unit.as_ref().and_then(|u| u.price))?;
        Some(PriceSummary::new(
            gross,
            self.discount,
            self.payment_plan.as_ref(),
        ))
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
