// src/services/document_service.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use genpdf::{elements, style, Element};

use crate::{
    common::error::AppError,
    models::{
        auth::User,
        permission::{Permission, PermissionStatus},
        report::PermissionReport,
    },
    services::qr_service::QrService,
};

// PDFs: relatório do admin e o passe impresso com o QR
#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
    qr: QrService,
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::Error::msg(e.to_string()))
}

impl DocumentService {
    pub fn new(fonts_dir: impl Into<PathBuf>, qr: QrService) -> Self {
        Self { fonts_dir: fonts_dir.into(), qr }
    }

    fn document(&self, title: &str) -> Result<genpdf::Document, AppError> {
        // Carrega a família "Roboto" da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte não encontrada em {}", self.fonts_dir.display()))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }

    fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }

    pub fn report_pdf(&self, report: &PermissionReport, generated_at: DateTime<Utc>) -> Result<Vec<u8>, AppError> {
        let mut doc = self.document("Permission Report")?;

        doc.push(elements::Paragraph::new("PERMISSION REPORT").styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Paragraph::new(format!(
            "Generated {} | Range: {:?} | Total: {}",
            generated_at.format("%d/%m/%Y %H:%M"),
            report.range,
            report.total
        )));
        doc.push(elements::Break::new(1.5));

        // --- RESUMO ---
        let bold = style::Style::new().bold();
        doc.push(elements::Paragraph::new("Status").styled(bold));
        for status in PermissionStatus::ALL {
            doc.push(elements::Paragraph::new(format!("{}: {}", status.as_str(), report.count_for(status))));
        }
        doc.push(elements::Break::new(1));

        doc.push(elements::Paragraph::new("Departments").styled(bold));
        for row in &report.department_counts {
            doc.push(elements::Paragraph::new(format!("{}: {}", row.department, row.count)));
        }
        doc.push(elements::Break::new(1.5));

        // --- TABELA ---
        // Pesos: Funcionário (3), Tipo (2), Início (3), Duração (2), Status (2)
        let mut table = elements::TableLayout::new(vec![3, 2, 3, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        table
            .row()
            .element(elements::Paragraph::new("Employee").styled(bold))
            .element(elements::Paragraph::new("Type").styled(bold))
            .element(elements::Paragraph::new("Start").styled(bold))
            .element(elements::Paragraph::new("Duration").styled(bold))
            .element(elements::Paragraph::new("Status").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for row in &report.permissions {
            let p = &row.permission;
            let owner = row.user.as_ref().map(|u| u.name.as_str()).unwrap_or("Unknown");
            table
                .row()
                .element(elements::Paragraph::new(owner))
                .element(elements::Paragraph::new(p.kind.label()))
                .element(elements::Paragraph::new(p.start_time.format("%d/%m/%Y %H:%M").to_string()))
                .element(elements::Paragraph::new(row.duration.as_str()))
                .element(elements::Paragraph::new(p.status.as_str()))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);

        Self::render(doc)
    }

    /// Passe impresso: dados da permissão e o QR com o id.
    pub fn permission_pass_pdf(&self, permission: &Permission, owner: Option<&User>) -> Result<Vec<u8>, AppError> {
        if permission.qr_code.is_none() || !permission.status.is_scannable() {
            return Err(AppError::QrUnavailable);
        }

        let mut doc = self.document(&format!("Permission {}", permission.id))?;

        doc.push(elements::Paragraph::new("PERMISSION PASS").styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Paragraph::new(format!("ID: {}", permission.id)));
        if let Some(owner) = owner {
            doc.push(elements::Paragraph::new(format!("Employee: {} ({})", owner.name, owner.email)));
        }
        doc.push(elements::Paragraph::new(format!("Type: {}", permission.kind.label())));
        doc.push(elements::Paragraph::new(format!("Reason: {}", permission.reason)));
        doc.push(elements::Paragraph::new(format!(
            "From {} to {} ({})",
            permission.start_time.format("%d/%m/%Y %H:%M"),
            permission.end_time.format("%d/%m/%Y %H:%M"),
            permission.duration()
        )));
        doc.push(elements::Break::new(2));

        let dynamic_image = image::DynamicImage::ImageLuma8(self.qr.render(&permission.id)?);
        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);

        doc.push(elements::Break::new(1));
        doc.push(
            elements::Paragraph::new("Show this code to security when leaving and returning.")
                .styled(style::Style::new().italic().with_font_size(8)),
        );

        Self::render(doc)
    }
}
