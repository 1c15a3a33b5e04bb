//! Server-rendered HTML for the progress form.
//!
//! One page: network banner, auth panel, project selector, update form and the
//! project's attachments.

use std::fmt::Write as _;

use chantier_core::{AuthUser, Banner, Project, StoredDocument, UPLOAD_ACCEPT};

use crate::session::FormState;

const PAGE_CSS: &str = include_str!("page.css");

pub const TITLE: &str = "Suivi d’avancement — Saisie hebdomadaire";

/// Everything the page needs, gathered by the handler.
#[derive(Debug, Default)]
pub struct PageView {
    pub network: Option<Banner>,
    pub banners: Vec<Banner>,
    pub user: Option<AuthUser>,
    pub show_auth_panel: bool,
    pub signup_mode: bool,
    pub projects: Vec<Project>,
    pub selected_project_id: Option<String>,
    pub form: FormState,
    pub uploader_version: u64,
    pub documents: Vec<StoredDocument>,
    pub max_upload_mb: u64,
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn banner(out: &mut String, banner: &Banner) {
    let _ = write!(
        out,
        r#"<div class="banner {}" role="status">{}</div>"#,
        banner.kind.as_str(),
        escape(&banner.message)
    );
}

fn percent_value(value: Option<f64>) -> String {
    value.map_or_else(|| "0".to_owned(), |v| v.to_string())
}

pub fn render(view: &PageView) -> String {
    let mut out = String::with_capacity(8 * 1024);
    let _ = write!(
        out,
        r#"<!doctype html><html lang="fr"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{}</title><style>{PAGE_CSS}</style></head><body><main>"#,
        escape(TITLE)
    );
    if let Some(network) = &view.network {
        banner(&mut out, network);
    }

    let two_columns = view.show_auth_panel || view.user.is_none();
    out.push_str(if two_columns { r#"<div class="layout">"# } else { r#"<div class="layout single">"# });
    if two_columns {
        out.push_str(r#"<section class="panel" id="auth">"#);
        auth_panel(&mut out, view);
        out.push_str("</section>");
    }
    out.push_str(r#"<section class="panel" id="form">"#);
    for b in &view.banners {
        banner(&mut out, b);
    }
    form_panel(&mut out, view, !two_columns);
    out.push_str("</section></div></main></body></html>");
    out
}

fn whoami(out: &mut String, user: &AuthUser) {
    let _ = write!(
        out,
        r#"<div class="whoami"><span>Connecté : <strong>{}</strong></span><form method="post" action="/auth/logout"><button type="submit">Se déconnecter</button></form></div>"#,
        escape(user.label())
    );
}

fn auth_panel(out: &mut String, view: &PageView) {
    if let Some(user) = &view.user {
        whoami(out, user);
        return;
    }
    out.push_str("<h2>Connexion</h2>");
    let (action, button, other_href, other_label) = if view.signup_mode {
        ("/auth/signup", "Créer mon compte", "/", "Se connecter")
    } else {
        ("/auth/login", "Connexion", "/?mode=signup", "Créer un compte")
    };
    let _ = write!(
        out,
        r#"<form method="post" action="{action}"><label for="email">Email</label><input type="email" id="email" name="email" required><label for="password">Mot de passe</label><input type="password" id="password" name="password" required><button class="primary" type="submit">{button}</button></form><p class="muted"><a href="{other_href}">{other_label}</a></p>"#
    );
}

fn form_panel(out: &mut String, view: &PageView, show_whoami: bool) {
    out.push_str("<h1>Suivi d’avancement — Saisie</h1>");
    let Some(user) = &view.user else {
        banner(out, &Banner::info("Connecte-toi pour saisir une mise à jour."));
        return;
    };
    if show_whoami {
        whoami(out, user);
    }
    if view.projects.is_empty() {
        banner(out, &Banner::warning("Aucun projet disponible."));
        return;
    }

    out.push_str(r#"<form method="post" action="/project"><label for="project_id">Projet</label><select id="project_id" name="project_id" onchange="this.form.submit()">"#);
    for project in &view.projects {
        let selected = view.selected_project_id.as_deref() == Some(project.id.as_str());
        let _ = write!(
            out,
            r#"<option value="{}"{}>{}</option>"#,
            escape(&project.id),
            if selected { " selected" } else { "" },
            escape(&project.name)
        );
    }
    out.push_str(r#"</select><noscript><button type="submit">Changer</button></noscript></form>"#);

    let form = &view.form;
    let _ = write!(
        out,
        r#"<h2>Nouvelle mise à jour</h2><form method="post" action="/updates" enctype="multipart/form-data"><div class="row"><div><label for="progress_travaux">Progression travaux (%)</label><input type="number" id="progress_travaux" name="progress_travaux" min="0" max="100" step="1" value="{}"></div><div><label for="progress_paiements">Progression paiements (%)</label><input type="number" id="progress_paiements" name="progress_paiements" min="0" max="100" step="1" value="{}"></div></div><label for="pv_date">Date du PV de chantier (optionnel)</label><input type="date" id="pv_date" name="pv_date" value="{}"><label for="commentaires">Commentaires</label><textarea id="commentaires" name="commentaires" placeholder="Observations, risques, points bloquants…">{}</textarea><h3>Joindre le PV (PDF/DOCX/DOC)</h3><input type="file" id="uploader_{}" name="files" accept="{UPLOAD_ACCEPT}" multiple><p class="muted">{} Mo maximum par fichier.</p><button class="primary" type="submit">Enregistrer la mise à jour</button></form>"#,
        percent_value(form.progress_travaux),
        percent_value(form.progress_paiements),
        escape(&form.pv_date),
        escape(&form.commentaires),
        view.uploader_version,
        view.max_upload_mb,
    );

    out.push_str("<h2>Pièces jointes — PV de chantier</h2>");
    if view.documents.is_empty() {
        banner(out, &Banner::info("Aucun PV pour ce projet."));
        return;
    }
    out.push_str(r#"<ul class="documents">"#);
    for doc in &view.documents {
        out.push_str("<li>");
        match &doc.url {
            Some(url) => {
                let _ = write!(
                    out,
                    r#"<a href="{}" target="_blank" rel="noopener"><strong>{}</strong></a>"#,
                    escape(url),
                    escape(&doc.display_name)
                );
            },
            None => {
                let _ = write!(out, "<strong>{}</strong> <span class=\"muted\">(lien indisponible)</span>", escape(&doc.display_name));
            },
        }
        if let Some(at) = &doc.uploaded_at {
            let _ = write!(out, r#"<br><em class="muted">Uploadé le : {}</em>"#, escape(at));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}
