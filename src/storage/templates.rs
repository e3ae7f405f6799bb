//! Column templates for tabular exports
//!
//! A template is the ordered list of dotted paths that become the CSV
//! header. Fields of a record that are not listed are dropped on export.
//! Every column carries a short description, written next to the exports
//! as `<template>.columns.csv`.

/// One export column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Dotted path into the flattened record
    pub path: &'static str,
    pub description: &'static str,
}

const fn col(path: &'static str, description: &'static str) -> Column {
    Column { path, description }
}

/// Ordered export columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTemplate {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl ColumnTemplate {
    /// Vacancy detail merged with its listing item
    pub const VACANCIES: ColumnTemplate = ColumnTemplate {
        name: "vacancies",
        columns: VACANCY_COLUMNS,
    };

    /// Employer detail documents
    pub const EMPLOYERS: ColumnTemplate = ColumnTemplate {
        name: "employers",
        columns: EMPLOYER_COLUMNS,
    };

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header row, in column order
    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|column| column.path)
    }
}

const VACANCY_COLUMNS: &[Column] = &[
    col("id", "Vacancy identifier"),
    col("name", "Vacancy title"),
    col("description", "Full vacancy text (HTML)"),
    col("code", "Employer's internal vacancy code"),
    col("premium", "Premium placement"),
    col("archived", "Vacancy is in the archive"),
    col("approved", "Vacancy passed moderation"),
    col("has_test", "Applicants must pass a test"),
    col("internship", "Internship vacancy"),
    col("night_shifts", "Work includes night shifts"),
    col("accept_handicapped", "Open to applicants with disabilities"),
    col("accept_kids", "Open to applicants under 18"),
    col("accept_temporary", "Temporary employment accepted"),
    col("accept_incomplete_resumes", "Applications with incomplete resumes accepted"),
    col("allow_messages", "Messaging with the employer enabled"),
    col("response_letter_required", "Cover letter is required"),
    col("initial_created_at", "First publication date"),
    col("created_at", "Creation date of the current publication"),
    col("published_at", "Publication date"),
    col("url", "Vacancy resource in the API"),
    col("alternate_url", "Vacancy page on the site"),
    col("apply_alternate_url", "Application page on the site"),
    col("response_url", "External application URL"),
    col("negotiations_url", "Negotiations resource in the API"),
    col("suitable_resumes_url", "Suitable resumes resource in the API"),
    col("sort_point_distance", "Distance from the search point"),
    col("show_logo_in_search", "Logo is shown in search results"),
    col("billing_type.id", "Billing type"),
    col("type.id", "Vacancy type identifier"),
    col("type.name", "Vacancy type"),
    col("area.id", "Region identifier"),
    col("area.name", "Region"),
    col("area.url", "Region resource in the API"),
    col("address.city", "City"),
    col("address.street", "Street"),
    col("address.building", "Building"),
    col("address.description", "Address notes"),
    col("address.raw", "Full address as entered"),
    col("address.lat", "Latitude"),
    col("address.lng", "Longitude"),
    col("salary.from", "Lower salary bound"),
    col("salary.to", "Upper salary bound"),
    col("salary.currency", "Salary currency code"),
    col("salary.gross", "Salary is stated before tax"),
    col("experience.id", "Required experience identifier"),
    col("experience.name", "Required experience"),
    col("employment_form.id", "Employment form identifier"),
    col("employment_form.name", "Employment form"),
    col("department.id", "Department identifier"),
    col("department.name", "Department"),
    col("employer.id", "Employer identifier"),
    col("employer.name", "Employer name"),
    col("employer.trusted", "Employer is verified"),
    col("employer.url", "Employer resource in the API"),
    col("employer.alternate_url", "Employer page on the site"),
    col("employer.vacancies_url", "Employer vacancies search in the API"),
    col("employer.logo_urls.90", "Employer logo, 90px"),
    col("employer.logo_urls.240", "Employer logo, 240px"),
    col("employer.logo_urls.original", "Employer logo, original size"),
    col("contacts.name", "Contact person"),
    col("contacts.email", "Contact email"),
    col("contacts.call_tracking_enabled", "Calls to the contact phones are tracked"),
    col("insider_interview.id", "Insider interview identifier"),
    col("insider_interview.url", "Insider interview page"),
    col("test.id", "Test identifier"),
    col("test.required", "Test is mandatory"),
    col("snippet.requirement", "Requirements excerpt from search results"),
    col("snippet.responsibility", "Responsibilities excerpt from search results"),
    col("counters.responses", "New responses"),
    col("counters.total_responses", "All responses"),
];

const EMPLOYER_COLUMNS: &[Column] = &[
    col("id", "Employer identifier"),
    col("name", "Employer name"),
    col("type", "Employer type (company, agency, private recruiter)"),
    col("trusted", "Employer is verified"),
    col("accredited_it_employer", "Accredited IT company"),
    col("description", "Company description (HTML)"),
    col("site_url", "Company website"),
    col("alternate_url", "Employer page on the site"),
    col("vacancies_url", "Employer vacancies search in the API"),
    col("open_vacancies", "Number of open vacancies"),
    col("area.id", "Region identifier"),
    col("area.name", "Region"),
    col("area.url", "Region resource in the API"),
    col("logo_urls.90", "Logo, 90px"),
    col("logo_urls.240", "Logo, 240px"),
    col("logo_urls.original", "Logo, original size"),
    col("applicant_services.target_employer.count", "Applicants following the employer"),
    col("branding.template_code", "Branded page template"),
    col("branding.template_version_id", "Branded page template version"),
    col("branding.makeup.url", "Branded page makeup"),
    col("branding.constructor.url", "Branded page constructor"),
    col("branding.constructor.header_picture.resized_path", "Branded page header picture"),
];
