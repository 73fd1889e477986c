use strum::{Display, EnumIter};

/// Business days between a CP-25 notice and its hearing.
pub(crate) const HEARING_OFFSET_BUSINESS_DAYS: u32 = 22;

/// Notice templates the backend can render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub(crate) enum DocumentType {
    /// Prohibitory order attaching bank accounts.
    #[strum(to_string = "CP-3")]
    Cp3,
    /// Show-cause notice fixing a hearing.
    #[strum(to_string = "CP-25")]
    Cp25,
    /// Warrant of arrest.
    #[strum(to_string = "CP-26")]
    Cp26,
    #[strum(to_string = "ESTA Letter")]
    EstaLetter,
    #[strum(to_string = "Income Tax Letter")]
    IncomeTaxLetter,
}

impl DocumentType {
    pub fn label(self) -> String {
        self.to_string()
    }

    /// Path segment under `/notices/`.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Cp3 => "cp3",
            Self::Cp25 => "cp25",
            Self::Cp26 => "cp26",
            Self::EstaLetter => "esta-letter",
            Self::IncomeTaxLetter => "income-tax-letter",
        }
    }

    pub fn default_filename(self) -> &'static str {
        match self {
            Self::Cp3 => "CP-3.docx",
            Self::Cp25 => "CP-25.docx",
            Self::Cp26 => "CP-26.docx",
            Self::EstaLetter => "ESTA_Letter.docx",
            Self::IncomeTaxLetter => "Income_Tax_Letter.docx",
        }
    }

    /// Notices addressed to one or more named persons; their names feed the remark.
    pub fn is_multi_name(self) -> bool {
        matches!(self, Self::Cp25 | Self::Cp26)
    }

    pub fn success_message(self) -> String {
        format!("{} generated successfully", self.label())
    }

    pub fn failure_message(self) -> String {
        format!("Failed to generate {}", self.label())
    }
}
