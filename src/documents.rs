//! Document composition – typed context + locale → HTML.
//!
//! Every document is a MiniJinja template embedded at compile time. The
//! templates only read the context; anything derived (net price, DLD fee,
//! installment totals, amount in words, inlined images) is computed here
//! before rendering.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;

use crate::assets;
use crate::config::RenderOptions;
use crate::context::{
    Booking, Building, CustomerInfo, DocumentContext, Installment, PaymentPlan, PriceSummary,
    Unit,
};
use crate::error::{RenderError, Result};
use crate::format::{self, NOT_AVAILABLE};
use crate::locale::{self, Label, Locale};

// ---------------------------------------------------------------------------
// Document kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    BrokerAgreement,
    ReservationForm,
    SalesOffer,
    SalesPurchaseAgreement,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::BrokerAgreement,
        DocumentKind::ReservationForm,
        DocumentKind::SalesOffer,
        DocumentKind::SalesPurchaseAgreement,
    ];

    /// Stable identifier used by the CLI and the C API.
    pub fn slug(self) -> &'static str {
        match self {
            DocumentKind::BrokerAgreement => "broker-agreement",
            DocumentKind::ReservationForm => "reservation-form",
            DocumentKind::SalesOffer => "sales-offer",
            DocumentKind::SalesPurchaseAgreement => "spa",
        }
    }

    pub fn template_name(self) -> &'static str {
        match self {
            DocumentKind::BrokerAgreement => "broker_agreement.html",
            DocumentKind::ReservationForm => "reservation_form.html",
            DocumentKind::SalesOffer => "sales_offer.html",
            DocumentKind::SalesPurchaseAgreement => "spa.html",
        }
    }

    fn label_key(self) -> &'static str {
        match self {
            DocumentKind::BrokerAgreement => "broker_agreement",
            DocumentKind::ReservationForm => "reservation_form",
            DocumentKind::SalesOffer => "sales_offer",
            DocumentKind::SalesPurchaseAgreement => "spa",
        }
    }

    /// `(English, Arabic)` title.
    pub fn titles(self) -> (&'static str, &'static str) {
        locale::lookup(self.label_key()).unwrap_or((self.slug(), self.slug()))
    }
}

impl FromStr for DocumentKind {
    type Err = RenderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        DocumentKind::ALL
            .into_iter()
            .find(|k| k.slug() == wanted)
            .or(match wanted.as_str() {
                "broker" => Some(DocumentKind::BrokerAgreement),
                "reservation" => Some(DocumentKind::ReservationForm),
                "offer" => Some(DocumentKind::SalesOffer),
                "sales-purchase-agreement" => Some(DocumentKind::SalesPurchaseAgreement),
                _ => None,
            })
            .ok_or_else(|| RenderError::UnknownDocument(s.to_string()))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// ---------------------------------------------------------------------------
// Embedded templates
// ---------------------------------------------------------------------------

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("macros.html", include_str!("../templates/macros.html")),
    ("styles.css", include_str!("../templates/styles.css")),
    ("partials/customers.html", include_str!("../templates/partials/customers.html")),
    ("partials/unit.html", include_str!("../templates/partials/unit.html")),
    ("partials/price.html", include_str!("../templates/partials/price.html")),
    ("partials/installments.html", include_str!("../templates/partials/installments.html")),
    ("partials/signatures.html", include_str!("../templates/partials/signatures.html")),
    ("partials/appendices.html", include_str!("../templates/partials/appendices.html")),
    ("broker_agreement.html", include_str!("../templates/broker_agreement.html")),
    ("reservation_form.html", include_str!("../templates/reservation_form.html")),
    ("sales_offer.html", include_str!("../templates/sales_offer.html")),
    ("spa.html", include_str!("../templates/spa.html")),
];

fn embedded_loader(name: &str) -> std::result::Result<Option<String>, minijinja::Error> {
    Ok(TEMPLATES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, src)| src.to_string()))
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

fn is_blank(value: &Value) -> bool {
    value.is_undefined() || value.is_none() || value.as_str().is_some_and(|s| s.trim().is_empty())
}

fn as_number(value: &Value) -> Option<f64> {
    if is_blank(value) {
        return None;
    }
    match value.as_str() {
        Some(s) => s.trim().replace(',', "").parse().ok(),
        None => f64::try_from(value.clone()).ok(),
    }
}

fn or_na(value: Value) -> String {
    if is_blank(&value) {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

fn money(value: Value) -> String {
    as_number(&value).map_or_else(|| NOT_AVAILABLE.to_string(), format::format_money)
}

fn pct(value: Value) -> String {
    as_number(&value).map_or_else(|| NOT_AVAILABLE.to_string(), format::format_percent)
}

fn area(value: Value) -> String {
    as_number(&value).map_or_else(|| NOT_AVAILABLE.to_string(), format::format_area)
}

fn words(value: Value) -> String {
    as_number(&value).map_or_else(|| NOT_AVAILABLE.to_string(), format::amount_in_words)
}

fn date(value: Value) -> String {
    value
        .as_str()
        .and_then(format::parse_date)
        .map_or_else(|| NOT_AVAILABLE.to_string(), format::format_date)
}

fn long_date(value: Value) -> String {
    value
        .as_str()
        .and_then(format::parse_date)
        .map_or_else(|| NOT_AVAILABLE.to_string(), format::format_long_date)
}

// ---------------------------------------------------------------------------
// Composer
// ---------------------------------------------------------------------------

/// Owns the template environment. Immutable once built, so one instance can
/// serve every render call.
pub struct DocumentComposer {
    env: Environment<'static>,
}

impl Default for DocumentComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentComposer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(embedded_loader);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.add_filter("or_na", or_na);
        env.add_filter("money", money);
        env.add_filter("pct", pct);
        env.add_filter("area", area);
        env.add_filter("words", words);
        env.add_filter("date", date);
        env.add_filter("long_date", long_date);

        Self { env }
    }

    /// Process-wide composer.
    pub fn shared() -> &'static DocumentComposer {
        static SHARED: OnceLock<DocumentComposer> = OnceLock::new();
        SHARED.get_or_init(DocumentComposer::new)
    }

    /// Compose the HTML for `kind`. `context` must be of the same kind.
    pub fn compose(
        &self,
        kind: DocumentKind,
        context: &DocumentContext,
        options: &RenderOptions,
    ) -> Result<String> {
        if context.kind() != kind {
            return Err(RenderError::ContextMismatch {
                expected: kind,
                found: context.kind(),
            });
        }

        let mut vars = TemplateVars::common(kind, options);
        match context {
            DocumentContext::BrokerAgreement(ctx) => {
                vars.set("broker", &ctx.broker);
                vars.set("project", &ctx.project);
                vars.set("agreement_date", ctx.agreement_date);
                vars.set("start_date", ctx.start_date);
                vars.set("end_date", ctx.end_date);
                let broker_name = ctx.broker.as_ref().and_then(|b| b.company_name.clone());
                vars.set(
                    "signatories",
                    vec![
                        Signatory::new("for_seller", Some(options.developer.name.clone()), options),
                        Signatory::new("for_broker", broker_name, options),
                    ],
                );
            }
            DocumentContext::ReservationForm(ctx) => {
                vars.set_booking(ctx.booking.as_ref(), options);
            }
            DocumentContext::SalesPurchaseAgreement(ctx) => {
                vars.set_booking(ctx.booking.as_ref(), options);
                let words = ctx
                    .booking
                    .as_ref()
                    .and_then(Booking::price_summary)
                    .map(|p| format::amount_in_words(p.net));
                vars.set("price_words", words);
            }
            DocumentContext::SalesOffer(ctx) => {
                let offer = ctx.sales_offer.as_ref();
                vars.set("offer", offer);
                vars.set_unit(offer.and_then(|o| o.unit.as_ref()));
                vars.set("customer", offer.and_then(|o| o.customer.as_ref()));
                vars.set_plan(offer.and_then(|o| o.payment_plan.as_ref()));
                vars.set("price", offer.and_then(|o| o.price_summary()));
            }
        }

        let template = self.env.get_template(kind.template_name())?;
        let html = template.render(Value::from_serialize(&vars.0))?;
        log::debug!(
            "Composed {kind} ({}, {} bytes)",
            options.locale,
            html.len()
        );
        Ok(html)
    }
}

/// Compose with the process-wide composer.
pub fn compose_html(
    kind: DocumentKind,
    context: &DocumentContext,
    options: &RenderOptions,
) -> Result<String> {
    DocumentComposer::shared().compose(kind, context, options)
}

// ---------------------------------------------------------------------------
// Template variables
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Signatory {
    role: Label,
    name: Option<String>,
}

impl Signatory {
    fn new(role_key: &'static str, name: Option<String>, options: &RenderOptions) -> Self {
        let (en, ar) = locale::lookup(role_key).unwrap_or((role_key, role_key));
        Self {
            role: Label {
                en,
                ar,
                text: options.locale.text(en, ar),
                mode: options.locale.code(),
            },
            name,
        }
    }
}

struct TemplateVars(BTreeMap<&'static str, Value>);

impl TemplateVars {
    fn common(kind: DocumentKind, options: &RenderOptions) -> Self {
        let locale: Locale = options.locale;
        let (title_en, title_ar) = kind.titles();
        let mut vars = Self(BTreeMap::new());
        vars.set("kind", kind.slug());
        vars.set("title", options.title(kind));
        vars.set("title_en", title_en);
        vars.set("title_ar", title_ar);
        vars.set("lang", locale.lang());
        vars.set("dir", locale.direction().as_str());
        vars.set("mode", locale.code());
        vars.set("show_en", locale.shows_english());
        vars.set("show_ar", locale.shows_arabic());
        vars.set("l", locale::labels(locale));
        vars.set("currency", &options.currency);
        vars.set("developer", &options.developer);
        vars.set(
            "logo",
            assets::embed_optional(options.developer.logo_path.as_deref()),
        );
        vars
    }

    fn set<T: Serialize>(&mut self, key: &'static str, value: T) {
        self.0.insert(key, Value::from_serialize(&value));
    }

    fn set_unit(&mut self, unit: Option<&Unit>) {
        let building: Option<&Building> = unit.and_then(|u| u.building.as_ref());
        self.set("unit", unit);
        self.set("building", building);
        self.set(
            "floor_plan",
            assets::embed_optional(unit.and_then(|u| u.floor_plan_path.as_deref())),
        );
        self.set(
            "building_image",
            assets::embed_optional(building.and_then(|b| b.image_path.as_deref())),
        );
    }

    fn set_plan(&mut self, plan: Option<&PaymentPlan>) {
        let installments: &[Installment] = plan.map_or(&[], |p| p.installments.as_slice());
        self.set("plan", plan);
        self.set("installments", installments);
        self.set("totals", plan.map(PaymentPlan::totals));
    }

    fn set_booking(&mut self, booking: Option<&Booking>, options: &RenderOptions) {
        let customers: &[CustomerInfo] = booking.map_or(&[], |b| b.customers.as_slice());
        let price: Option<PriceSummary> = booking.and_then(Booking::price_summary);

        self.set("booking", booking);
        self.set_unit(booking.and_then(|b| b.unit.as_ref()));
        self.set("customers", customers);
        self.set_plan(booking.and_then(|b| b.payment_plan.as_ref()));
        self.set("price", price);

        let mut signatories = vec![Signatory::new(
            "for_seller",
            Some(options.developer.name.clone()),
            options,
        )];
        if customers.is_empty() {
            signatories.push(Signatory::new("purchaser", None, options));
        }
        for customer in customers {
            signatories.push(Signatory::new("purchaser", customer.name.clone(), options));
        }
        self.set("signatories", signatories);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ReservationContext, SalesOfferContext, SalesOffer};

    #[test]
    fn kind_slugs_roundtrip() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.slug().parse::<DocumentKind>().unwrap(), kind);
        }
        assert_eq!(
            "sales_offer".parse::<DocumentKind>().unwrap(),
            DocumentKind::SalesOffer
        );
        assert!(matches!(
            "invoice".parse::<DocumentKind>(),
            Err(RenderError::UnknownDocument(_))
        ));
    }

    #[test]
    fn every_template_is_embedded() {
        let composer = DocumentComposer::new();
        for kind in DocumentKind::ALL {
            assert!(composer.env.get_template(kind.template_name()).is_ok());
        }
    }

    #[test]
    fn filters_null_guard() {
        assert_eq!(or_na(Value::from(())), "N/A");
        assert_eq!(or_na(Value::UNDEFINED), "N/A");
        assert_eq!(or_na(Value::from("  ")), "N/A");
        assert_eq!(or_na(Value::from("A-101")), "A-101");
        assert_eq!(money(Value::from(1500)), "1,500.00");
        assert_eq!(money(Value::from(())), "N/A");
        assert_eq!(pct(Value::from(12.5)), "12.5%");
        assert_eq!(date(Value::from("2025-06-30")), "30/06/2025");
        assert_eq!(date(Value::from("garbage")), "N/A");
    }

    #[test]
    fn mismatched_context_is_rejected() {
        let ctx = DocumentContext::ReservationForm(ReservationContext::default());
        let err = DocumentComposer::new()
            .compose(DocumentKind::SalesOffer, &ctx, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::ContextMismatch {
                expected: DocumentKind::SalesOffer,
                found: DocumentKind::ReservationForm
            }
        ));
    }

    #[test]
    fn interpolated_text_is_escaped() {
        let ctx = DocumentContext::SalesOffer(SalesOfferContext {
            sales_offer: Some(SalesOffer {
                notes: Some("<script>alert(1)</script>".into()),
                ..Default::default()
            }),
        });
        let html = DocumentComposer::new()
            .compose(DocumentKind::SalesOffer, &ctx, &RenderOptions::default())
            .unwrap();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
