//! Integration tests for estate-forge.
//!
//! These tests validate:
//! - Composed HTML carries the expected literal strings per context
//! - Absent context degrades to placeholders, never errors
//! - Locale modes (English, Arabic, bilingual)
//! - PDF output exists, has a valid header and paginates with footers
//! - Composition is deterministic

use estate_forge::config::RenderOptions;
use estate_forge::context::DocumentContext;
use estate_forge::documents::{compose_html, DocumentKind};
use estate_forge::dom::text_content;
use estate_forge::layout_config::LayoutConfig;
use estate_forge::locale::Locale;
use estate_forge::pipeline::{compute_layout_config, render_document, render_document_json};
use estate_forge::render::render_pdf;
use estate_forge::RenderError;
use sha2::{Digest, Sha256};

// =====================================================================
// Fixtures
// =====================================================================

const UNIT: &str = r#"{
    "unit_no": "A-101", "unit_type": "Apartment", "floor": "1", "bedrooms": "2",
    "suite_area": 1150.5, "total_area": 1300, "parking_spaces": 1, "price": 1250000,
    "building": {"name": "Marina Heights", "project_name": "Marina Bay",
                 "location": "Dubai Marina", "completion_date": "2027-06-30"}
}"#;

fn installments(n: usize) -> String {
    let share = 100.0 / n.max(1) as f64;
    let rows: Vec<String> = (1..=n)
        .map(|i| {
            format!(
                r#"{{"description": "Installment {i}", "due_date": "2026-{:02}-01", "percentage": {share}, "amount": {}}}"#,
                (i % 12) + 1,
                1_250_000.0 * share / 100.0
            )
        })
        .collect();
    rows.join(",")
}

fn booking_json(installment_count: usize, discount: f64) -> String {
    format!(
        r#"{{"booking": {{
            "reference": "RES-2025-001", "booking_date": "2025-03-01",
            "sales_agent": "Sara",
            "unit": {UNIT},
            "customers": [{{"name": "John Smith", "nationality": "British", "passport_no": "P123"}}],
            "payment_plan": {{"name": "60/40", "dld_fee_percentage": 4,
                              "installments": [{}]}},
            "price": 1250000, "discount": {discount}
        }}}}"#,
        installments(installment_count)
    )
}

fn offer_json(discount: f64) -> String {
    format!(
        r#"{{"sales_offer": {{
            "reference": "SO-9", "offer_date": "2025-02-01", "valid_until": "2025-02-15",
            "unit": {UNIT},
            "customer": {{"name": "Jane Doe"}},
            "original_price": 1250000, "discount": {discount},
            "payment_plan": {{"name": "Standard", "installments": [{}]}}
        }}}}"#,
        installments(3)
    )
}

fn compose(kind: DocumentKind, json: &str, locale: Locale) -> String {
    let ctx = DocumentContext::from_json(kind, json).unwrap();
    compose_html(kind, &ctx, &RenderOptions::with_locale(locale)).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

// =====================================================================
// Snapshot properties
// =====================================================================

#[test]
fn unit_number_is_labelled() {
    for kind in [DocumentKind::ReservationForm, DocumentKind::SalesPurchaseAgreement] {
        let html = compose(kind, &booking_json(3, 0.0), Locale::English);
        let text = text_content(&html);
        assert!(text.contains("Unit No: A-101"), "{kind}: {text}");
    }
    let html = compose(DocumentKind::SalesOffer, &offer_json(0.0), Locale::English);
    assert!(text_content(&html).contains("Unit No: A-101"));
}

#[test]
fn zero_installments_omit_the_table() {
    let html = compose(DocumentKind::ReservationForm, &booking_json(0, 0.0), Locale::English);
    assert!(!html.contains("installments\""), "installment table rendered");
    assert!(!html.contains("class=\"installment\""));
    // The plan itself is still described.
    assert!(text_content(&html).contains("Payment Plan"));
}

#[test]
fn installments_render_in_order() {
    let html = compose(DocumentKind::ReservationForm, &booking_json(4, 0.0), Locale::English);
    assert_eq!(html.matches("class=\"installment\"").count(), 4);
    let text = text_content(&html);
    let positions: Vec<usize> = (1..=4)
        .map(|i| text.find(&format!("Installment {i}")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn milestone_stands_in_for_a_missing_due_date() {
    let json = r#"{"booking": {"payment_plan": {"name": "Construction linked", "installments": [
        {"description": "Down payment", "due_date": "2025-03-01", "percentage": 20},
        {"description": "Structure", "milestone": "50% construction", "percentage": 80}
    ]}}}"#;
    let text = text_content(&compose(DocumentKind::ReservationForm, json, Locale::English));
    assert!(text.contains("Due Date / Milestone"), "{text}");
    assert!(text.contains("01/03/2025"));
    assert!(text.contains("50% construction"));
}

#[test]
fn zero_discount_omits_discount_line() {
    let html = compose(DocumentKind::SalesOffer, &offer_json(0.0), Locale::English);
    let text = text_content(&html);
    assert!(!text.contains("Discount:"), "{text}");
    assert!(text.contains("Purchase Price: AED 1,250,000.00"));
}

#[test]
fn discount_shows_original_and_net() {
    let html = compose(DocumentKind::SalesOffer, &offer_json(50_000.0), Locale::English);
    let text = text_content(&html);
    assert!(text.contains("Original Price: AED 1,250,000.00"), "{text}");
    assert!(text.contains("Discount: AED 50,000.00"));
    assert!(text.contains("AED 1,200,000.00"));
}

#[test]
fn missing_data_degrades_to_placeholders() {
    let html = compose(DocumentKind::ReservationForm, r#"{"booking": {}}"#, Locale::English);
    let text = text_content(&html);
    assert!(text.contains("No unit data available"), "{text}");

    let html = compose(DocumentKind::SalesOffer, "{}", Locale::English);
    assert!(text_content(&html).contains("Sales Offer"));
}

#[test]
fn null_fields_render_not_available() {
    let json = r#"{"booking": {"unit": {"unit_no": "C-3"}}}"#;
    let text = text_content(&compose(DocumentKind::SalesPurchaseAgreement, json, Locale::English));
    assert!(text.contains("Unit No: C-3"));
    assert!(text.contains("Unit Type: N/A"), "{text}");
}

#[test]
fn numeric_floor_and_bedrooms_still_render() {
    let json = r#"{"booking": {"unit": {"unit_no": "A-101", "floor": 5, "bedrooms": 2}}}"#;
    let doc =
        render_document_json(DocumentKind::ReservationForm, json, &RenderOptions::default())
            .unwrap();
    let text = text_content(&doc.html);
    assert!(text.contains("Unit No: A-101"), "{text}");
    assert!(text.contains("Floor: 5"), "{text}");
    assert!(text.contains("Bedrooms: 2"), "{text}");
    assert_valid_pdf(&doc.pdf);
}

#[test]
fn long_offer_notes_stay_inside_the_page() {
    let notes = vec!["Subject to availability and final approval."; 600].join(" ");
    let json = format!(r#"{{"sales_offer": {{"reference": "SO-1", "notes": "{notes}"}}}}"#);
    let options = RenderOptions::default();
    let kind = DocumentKind::SalesOffer;
    let ctx = DocumentContext::from_json(kind, &json).unwrap();
    let html = compose_html(kind, &ctx, &options).unwrap();
    let layout = compute_layout_config(&html, &options.pipeline_config(kind)).unwrap();

    assert!(layout.page_count() > 1);
    for page in &layout.pages {
        for b in &page.boxes {
            if let Some(t) = &b.text {
                for line in &t.lines {
                    let bottom = b.y + line.y_offset + t.line_height;
                    assert!(bottom <= layout.page_height_pt, "line bottom {bottom}");
                }
            }
        }
    }
}

// =====================================================================
// Locales
// =====================================================================

#[test]
fn arabic_output_is_rtl_with_arabic_labels() {
    let html = compose(DocumentKind::SalesOffer, &offer_json(0.0), Locale::Arabic);
    assert!(html.contains(r#"<html lang="ar" dir="rtl">"#));
    assert!(text_content(&html).contains("رقم الوحدة"));
    assert!(!text_content(&html).contains("Unit No"));
}

#[test]
fn bilingual_rows_carry_both_labels() {
    let html = compose(DocumentKind::ReservationForm, &booking_json(2, 0.0), Locale::Bilingual);
    let text = text_content(&html);
    assert!(text.contains("Unit No: A-101 رقم الوحدة:"), "{text}");
    assert!(html.contains(r#"dir="rtl""#));
    assert!(html.contains(r#"<html lang="en" dir="ltr">"#));
}

// =====================================================================
// Broker agreement
// =====================================================================

#[test]
fn broker_agreement_lists_broker_and_commission() {
    let json = r#"{
        "broker": {"company_name": "Prime Realty", "orn_no": "ORN-55",
                   "commission_percentage": 2},
        "project": {"project_name": "Marina Bay"},
        "agreement_date": "2025-01-10"
    }"#;
    let text = text_content(&compose(DocumentKind::BrokerAgreement, json, Locale::English));
    assert!(text.contains("Prime Realty"));
    assert!(text.contains("ORN-55"));
    assert!(text.contains("2%"), "{text}");
}

// =====================================================================
// Errors
// =====================================================================

#[test]
fn wrong_context_kind_is_rejected() {
    let ctx = DocumentContext::from_json(DocumentKind::SalesOffer, &offer_json(0.0)).unwrap();
    let err = render_document(DocumentKind::SalesPurchaseAgreement, &ctx, &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::ContextMismatch {
            expected: DocumentKind::SalesPurchaseAgreement,
            found: DocumentKind::SalesOffer
        }
    ));
}

#[test]
fn malformed_json_is_an_error() {
    let err = render_document_json(DocumentKind::SalesOffer, "{oops", &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, RenderError::Json(_)));
}

// =====================================================================
// Determinism
// =====================================================================

#[test]
fn composition_is_deterministic() {
    let digest = |html: &str| Sha256::digest(html.as_bytes());
    for locale in [Locale::English, Locale::Arabic, Locale::Bilingual] {
        let a = compose(DocumentKind::SalesPurchaseAgreement, &booking_json(6, 1000.0), locale);
        let b = compose(DocumentKind::SalesPurchaseAgreement, &booking_json(6, 1000.0), locale);
        assert_eq!(digest(&a), digest(&b), "{locale}");
    }
}

// =====================================================================
// PDF output
// =====================================================================

#[test]
fn every_document_kind_renders_a_pdf() {
    let cases = [
        (DocumentKind::BrokerAgreement, r#"{"broker": {"company_name": "Prime"}}"#.to_string()),
        (DocumentKind::ReservationForm, booking_json(3, 0.0)),
        (DocumentKind::SalesOffer, offer_json(10_000.0)),
        (DocumentKind::SalesPurchaseAgreement, booking_json(3, 0.0)),
    ];
    for (kind, json) in cases {
        let doc = render_document_json(kind, &json, &RenderOptions::default()).unwrap();
        assert_eq!(doc.kind, kind);
        assert_valid_pdf(&doc.pdf);
        assert!(doc.pages >= 1);
        assert!(doc.html.contains("<html"));
    }
}

#[test]
fn long_schedule_paginates_with_footer_on_every_page() {
    let options = RenderOptions::default();
    let kind = DocumentKind::ReservationForm;
    let ctx = DocumentContext::from_json(kind, &booking_json(80, 0.0)).unwrap();
    let html = compose_html(kind, &ctx, &options).unwrap();
    let layout = compute_layout_config(&html, &options.pipeline_config(kind)).unwrap();

    let total = layout.page_count();
    assert!(total > 1, "expected several pages, got {total}");
    for page in 0..total {
        let expected = format!("Page {} of {total}", page + 1);
        let text = layout.page_text(page);
        assert!(
            text.iter().any(|line| line.contains(&expected)),
            "page {page} lacks footer: {text:?}"
        );
    }
}

#[test]
fn layout_json_renders_separately() {
    let options = RenderOptions::default();
    let kind = DocumentKind::SalesOffer;
    let ctx = DocumentContext::from_json(kind, &offer_json(0.0)).unwrap();
    let html = compose_html(kind, &ctx, &options).unwrap();
    let layout = compute_layout_config(&html, &options.pipeline_config(kind)).unwrap();

    let json = layout.to_json().unwrap();
    let restored = LayoutConfig::from_json(&json).unwrap();
    assert_eq!(restored.page_count(), layout.page_count());
    assert_valid_pdf(&render_pdf(&restored).unwrap());
}

#[test]
fn arabic_document_renders_with_builtin_font() {
    let doc = render_document_json(
        DocumentKind::SalesPurchaseAgreement,
        &booking_json(2, 0.0),
        &RenderOptions::with_locale(Locale::Arabic),
    )
    .unwrap();
    assert_valid_pdf(&doc.pdf);
}

#[test]
fn images_that_do_not_exist_are_skipped() {
    let json = r#"{"booking": {"unit": {"unit_no": "A-1", "floor_plan_path": "/nope/plan.png"}}}"#;
    let doc =
        render_document_json(DocumentKind::ReservationForm, json, &RenderOptions::default()).unwrap();
    assert!(!doc.html.contains("data:image"));
    assert_valid_pdf(&doc.pdf);
}
