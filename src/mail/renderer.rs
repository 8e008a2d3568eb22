use tera::Tera;
use url::Url;

use crate::mail::{Mailable, MailError, RenderedEmail};

/// Path of the posts listing the mails link to, relative to the application base URL
pub const POSTS_INDEX_PATH: &str = "tweets";

/// Renders mailables into HTML and plain text bodies.
///
/// Templates are embedded at compile time; each mailable template exists as
/// `<name>.html`, built on `layout.html`, and `<name>.txt`.
pub struct MailRenderer {
    engine: Tera,
    posts_url: Url,
}

impl MailRenderer {
    /// Build a renderer whose links point at the application served from `base_url`
    pub fn new(base_url: &str) -> Result<Self, MailError> {
        // The application may be served under a path prefix, keep it
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let posts_url = base_url.join(POSTS_INDEX_PATH)?;

        let mut engine = Tera::default();
        engine
            .add_raw_templates(vec![
                ("layout.html", include_str!("../../templates/mail/layout.html")),
                (
                    "new_user_introduction.html",
                    include_str!("../../templates/mail/new_user_introduction.html"),
                ),
                (
                    "new_user_introduction.txt",
                    include_str!("../../templates/mail/new_user_introduction.txt"),
                ),
            ])
            .map_err(MailError::TemplateLoad)?;

        Ok(Self { engine, posts_url })
    }

    pub const fn posts_url(&self) -> &Url {
        &self.posts_url
    }

    /// Render both bodies of a mailable
    #[tracing::instrument(
        name = "Render mail",
        skip_all,
        fields(template = %mailable.template())
    )]
    pub fn render(&self, mailable: &dyn Mailable) -> Result<RenderedEmail, MailError> {
        let template = mailable.template();

        let mut context = mailable.context();
        context.insert("subject", mailable.subject());
        context.insert("posts_url", self.posts_url.as_str());

        let html_body = self.render_template(&format!("{template}.html"), &context)?;
        let text_body = self.render_template(&format!("{template}.txt"), &context)?;

        Ok(RenderedEmail {
            to: mailable.recipient().clone(),
            subject: mailable.subject().to_string(),
            html_body,
            text_body,
        })
    }

    fn render_template(&self, name: &str, context: &tera::Context) -> Result<String, MailError> {
        self.engine
            .render(name, context)
            .map_err(|source| MailError::Render {
                template: name.to_string(),
                source,
            })
    }
}
