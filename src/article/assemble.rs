use chrono::NaiveDate;
use html_escape::encode_text;
use select::document::Document;
use select::predicate::Name;
use serde_json::json;

use super::extract::{heading_id, Extraction};
use crate::topic::Topic;

const PUBLISHER: &str = "Aquarium Analyser";
const PUBLISHER_LOGO: &str = "/images/logo.png";

/// Shown in place of the article when the content site cannot be reached.
pub const ERROR_FRAGMENT: &str = r#"<div class="p-8 text-center">
  <h1 class="text-2xl font-bold mb-4">Error Loading Article</h1>
  <p>We encountered an error while trying to load the article content. Please try again later.</p>
</div>"#;

/// Builds the self-contained article fragment served to the client.
pub fn assemble(topic: Topic, extraction: &Extraction, today: NaiveDate) -> String {
    let profile = topic.profile();

    let mut body = String::new();
    match extraction {
        Extraction::Extracted(content) => {
            if !first_paragraph_mentions(&content.html, profile.display_name) {
                body.push_str(&intro_paragraph(topic));
            }
            body.push_str(&content.html);
        }
        Extraction::FallbackTemplate { .. } => body.push_str(&fallback_body(topic)),
    }
    body.push_str(&conclusion(topic));
    body.push_str(&call_to_action());

    let first_image = extraction.images().first().map(|image| image.local_path.as_str());
    let title = extraction.title().unwrap_or(profile.headline);

    format!(
        r#"<article class="max-w-4xl mx-auto px-4 py-8">
  <header>
    <h1 class="text-3xl md:text-4xl font-bold mb-6">{title}</h1>
  </header>
  <div class="prose prose-lg dark:prose-invert max-w-none">
{body}
  </div>
{schema}
</article>"#,
        title = encode_text(title),
        body = body,
        schema = schema_markup(topic, first_image, today),
    )
}

fn first_paragraph_mentions(html: &str, name: &str) -> bool {
    Document::from(html)
        .find(Name("p"))
        .next()
        .map(|p| p.text().to_lowercase().contains(&name.to_lowercase()))
        .unwrap_or(false)
}

fn intro_paragraph(topic: Topic) -> String {
    let profile = topic.profile();
    format!(
        r#"<p class="text-lg font-medium leading-7 mb-6">{name}, {clause}. This comprehensive guide will show you effective methods to control and eliminate {name} from your tank, ensuring a healthier environment for your aquatic plants and fish.</p>
"#,
        name = profile.display_name,
        clause = profile.intro_clause,
    )
}

fn fallback_body(topic: Topic) -> String {
    let mut html = String::new();
    for section in topic.profile().fallback {
        html.push_str(&format!(
            "<h2 id=\"{}\" class=\"text-2xl font-bold mt-8 mb-4\">{}</h2>\n",
            heading_id(section.heading),
            encode_text(section.heading)
        ));
        for paragraph in section.paragraphs {
            html.push_str(&format!("<p class=\"mb-4\">{}</p>\n", encode_text(paragraph)));
        }
    }
    html
}

fn conclusion(topic: Topic) -> String {
    let profile = topic.profile();
    let mut html = format!(
        "<h2 id=\"conclusion\" class=\"text-2xl font-bold mt-8 mb-4\">Conclusion: Your Path to a {}-Free Aquarium</h2>\n",
        profile.short_name
    );
    for paragraph in profile.conclusion {
        html.push_str(&format!("<p class=\"mb-4\">{}</p>\n", encode_text(paragraph)));
    }
    html
}

fn call_to_action() -> String {
    r#"<div class="bg-blue-50 dark:bg-blue-900 p-6 rounded-lg shadow-md mt-8 mb-4">
  <h3 class="text-xl font-semibold mb-4">Need More Help With Algae Problems?</h3>
  <p class="mb-4">Our Algae Analyzer tool can help identify various types of algae in your aquarium and provide customized treatment recommendations based on your specific situation.</p>
  <a href="/" class="inline-block bg-blue-600 hover:bg-blue-700 text-white font-medium py-2 px-6 rounded-lg transition-colors">Try Our Algae Analyzer</a>
</div>
"#
    .to_string()
}

/// `schema.org/Article` JSON-LD block.
fn schema_markup(topic: Topic, first_image: Option<&str>, today: NaiveDate) -> String {
    let profile = topic.profile();
    let date = today.format("%Y-%m-%d").to_string();
    let schema = json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": profile.headline,
        "description": profile.schema_description,
        "image": first_image.unwrap_or(""),
        "author": {
            "@type": "Organization",
            "name": PUBLISHER,
        },
        "publisher": {
            "@type": "Organization",
            "name": PUBLISHER,
            "logo": {
                "@type": "ImageObject",
                "url": PUBLISHER_LOGO,
            },
        },
        "datePublished": date,
        "dateModified": date,
    });
    format!("<script type=\"application/ld+json\">\n{:#}\n</script>", schema)
}
