//! Locales, text direction and the bilingual label catalogue.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Which language(s) a document is composed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
    /// English and Arabic side by side; the document flows left-to-right and
    /// Arabic cells carry `dir="rtl"`.
    Bilingual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Locale {
    pub fn direction(self) -> Direction {
        match self {
            Locale::Arabic => Direction::Rtl,
            Locale::English | Locale::Bilingual => Direction::Ltr,
        }
    }

    /// Value of the root `lang` attribute.
    pub fn lang(self) -> &'static str {
        match self {
            Locale::Arabic => "ar",
            Locale::English | Locale::Bilingual => "en",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Arabic => "ar",
            Locale::Bilingual => "bilingual",
        }
    }

    pub fn shows_english(self) -> bool {
        self != Locale::Arabic
    }

    pub fn shows_arabic(self) -> bool {
        self != Locale::English
    }

    /// Pick the text for this locale; bilingual joins both.
    pub fn text(self, en: &str, ar: &str) -> String {
        match self {
            Locale::English => en.to_string(),
            Locale::Arabic => ar.to_string(),
            Locale::Bilingual => format!("{en} / {ar}"),
        }
    }
}

impl FromStr for Locale {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "ar" | "arabic" => Ok(Locale::Arabic),
            "bilingual" | "both" | "en-ar" => Ok(Locale::Bilingual),
            other => Err(RenderError::UnknownLocale(other.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

// ---------------------------------------------------------------------------
// Label catalogue
// ---------------------------------------------------------------------------

/// One label as templates see it: `l.unit_no.en`, `l.unit_no.ar`, and
/// `l.unit_no.text` already resolved for the document locale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub en: &'static str,
    pub ar: &'static str,
    pub text: String,
    /// Locale code, so macros can switch to dual-column rows without access
    /// to the template context.
    pub mode: &'static str,
}

const LABELS: &[(&str, &str, &str)] = &[
    // Document titles
    ("broker_agreement", "Broker Agreement", "اتفاقية وساطة عقارية"),
    ("reservation_form", "Reservation Form", "نموذج حجز"),
    ("sales_offer", "Sales Offer", "عرض بيع"),
    ("spa", "Sale and Purchase Agreement", "اتفاقية بيع وشراء"),
    // Sections
    ("parties", "Parties", "الأطراف"),
    ("seller", "Seller", "البائع"),
    ("purchaser", "Purchaser", "المشتري"),
    ("purchasers", "Purchasers", "المشترون"),
    ("broker", "Broker", "الوسيط"),
    ("developer", "Developer", "المطور"),
    ("unit_details", "Unit Details", "تفاصيل الوحدة"),
    ("customer_details", "Customer Details", "بيانات العميل"),
    ("payment_plan", "Payment Plan", "خطة الدفع"),
    ("price_details", "Price Details", "تفاصيل السعر"),
    ("terms", "Terms and Conditions", "الشروط والأحكام"),
    ("signatures", "Signatures", "التوقيعات"),
    ("appendix_floor_plan", "Appendix A: Floor Plan", "الملحق أ: مخطط الطابق"),
    ("appendix_building", "Appendix B: Building", "الملحق ب: المبنى"),
    // Document fields
    ("reference", "Reference No", "رقم المرجع"),
    ("date", "Date", "التاريخ"),
    ("booking_date", "Booking Date", "تاريخ الحجز"),
    ("offer_date", "Offer Date", "تاريخ العرض"),
    ("valid_until", "Valid Until", "صالح حتى"),
    ("agreement_date", "Agreement Date", "تاريخ الاتفاقية"),
    ("start_date", "Start Date", "تاريخ البدء"),
    ("end_date", "End Date", "تاريخ الانتهاء"),
    ("sales_agent", "Sales Agent", "مستشار المبيعات"),
    ("notes", "Notes", "ملاحظات"),
    // Unit and building
    ("project", "Project", "المشروع"),
    ("building", "Building", "المبنى"),
    ("location", "Location", "الموقع"),
    ("plot_no", "Plot No", "رقم قطعة الأرض"),
    ("unit_no", "Unit No", "رقم الوحدة"),
    ("unit_type", "Unit Type", "نوع الوحدة"),
    ("floor", "Floor", "الطابق"),
    ("bedrooms", "Bedrooms", "غرف النوم"),
    ("view", "View", "الإطلالة"),
    ("suite_area", "Suite Area", "مساحة الوحدة"),
    ("balcony_area", "Balcony Area", "مساحة الشرفة"),
    ("total_area", "Total Area", "المساحة الإجمالية"),
    ("parking", "Parking Spaces", "مواقف السيارات"),
    ("completion_date", "Anticipated Completion", "تاريخ الإنجاز المتوقع"),
    // People and companies
    ("name", "Name", "الاسم"),
    ("nationality", "Nationality", "الجنسية"),
    ("passport_no", "Passport No", "رقم جواز السفر"),
    ("emirates_id", "Emirates ID", "رقم الهوية الإماراتية"),
    ("date_of_birth", "Date of Birth", "تاريخ الميلاد"),
    ("email", "Email", "البريد الإلكتروني"),
    ("phone", "Phone", "الهاتف"),
    ("address", "Address", "العنوان"),
    ("company_name", "Company Name", "اسم الشركة"),
    ("orn_no", "RERA ORN", "رقم تسجيل المكتب لدى ريرا"),
    ("trade_license_no", "Trade License No", "رقم الرخصة التجارية"),
    ("contact_person", "Contact Person", "الشخص المسؤول"),
    ("commission", "Commission", "العمولة"),
    // Prices
    ("purchase_price", "Purchase Price", "سعر الشراء"),
    ("original_price", "Original Price", "السعر الأصلي"),
    ("discount", "Discount", "الخصم"),
    ("net_price", "Net Price", "السعر الصافي"),
    ("dld_fee", "DLD Fee", "رسوم دائرة الأراضي والأملاك"),
    ("admin_fee", "Admin Fee", "الرسوم الإدارية"),
    ("amount_paid", "Amount Paid", "المبلغ المدفوع"),
    ("balance", "Balance Due", "الرصيد المستحق"),
    ("amount_in_words", "Amount in Words", "المبلغ بالحروف"),
    // Installment table
    ("plan_name", "Plan", "الخطة"),
    ("installment_no", "No.", "رقم"),
    ("description", "Description", "الوصف"),
    ("due_date", "Due Date", "تاريخ الاستحقاق"),
    ("milestone", "Milestone", "مرحلة الإنجاز"),
    ("percentage", "Percentage", "النسبة"),
    ("amount", "Amount", "المبلغ"),
    ("total", "Total", "المجموع"),
    // Signatures
    ("signature", "Signature", "التوقيع"),
    ("for_seller", "For and on behalf of the Seller", "بالنيابة عن البائع"),
    ("for_broker", "For and on behalf of the Broker", "بالنيابة عن الوسيط"),
    // Placeholders
    ("no_unit_data", "No unit data available", "لا تتوفر بيانات الوحدة"),
    ("no_customer_data", "No customer data available", "لا تتوفر بيانات العميل"),
    ("no_payment_plan", "No payment plan available", "لا تتوفر خطة دفع"),
    ("no_broker_data", "No broker data available", "لا تتوفر بيانات الوسيط"),
    ("no_booking_data", "No booking data available", "لا تتوفر بيانات الحجز"),
    ("no_offer_data", "No sales offer data available", "لا تتوفر بيانات العرض"),
    // Page furniture
    ("page_of", "Page {page} of {pages}", "صفحة {page} من {pages}"),
];

/// Look up the raw `(en, ar)` pair for a key.
pub fn lookup(key: &str) -> Option<(&'static str, &'static str)> {
    LABELS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, en, ar)| (*en, *ar))
}

/// The whole catalogue resolved for `locale`.
pub fn labels(locale: Locale) -> BTreeMap<&'static str, Label> {
    LABELS
        .iter()
        .map(|(key, en, ar)| {
            (
                *key,
                Label {
                    en,
                    ar,
                    text: locale.text(en, ar),
                    mode: locale.code(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_locale_codes() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::English);
        assert_eq!("AR".parse::<Locale>().unwrap(), Locale::Arabic);
        assert_eq!("bilingual".parse::<Locale>().unwrap(), Locale::Bilingual);
        assert!(matches!(
            "fr".parse::<Locale>(),
            Err(RenderError::UnknownLocale(_))
        ));
    }

    #[test]
    fn only_arabic_is_rtl() {
        assert_eq!(Locale::Arabic.direction(), Direction::Rtl);
        assert_eq!(Locale::Bilingual.direction(), Direction::Ltr);
    }

    #[test]
    fn label_text_follows_locale() {
        let en = labels(Locale::English);
        assert_eq!(en["unit_no"].text, "Unit No");
        let ar = labels(Locale::Arabic);
        assert_eq!(ar["unit_no"].text, "رقم الوحدة");
        let bi = labels(Locale::Bilingual);
        assert_eq!(bi["unit_no"].text, "Unit No / رقم الوحدة");
        assert_eq!(bi["unit_no"].mode, "bilingual");
    }

    #[test]
    fn catalogue_keys_are_unique() {
        let mut keys: Vec<&str> = LABELS.iter().map(|(k, _, _)| *k).collect();
        let n = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), n);
    }
}
