//! HTML pages served by the web front end.
//!
//! Pages are assembled from static fragments; every dynamic string goes
//! through [`escape_html`].

const FORM_SELECTS: [(&str, &str, &[&str]); 5] = [
    ("gender", "Gender", &["male", "female"]),
    (
        "race/ethnicity",
        "Race or Ethnicity",
        &["group A", "group B", "group C", "group D", "group E"],
    ),
    (
        "parental level of education",
        "Parental Level of Education",
        &[
            "associate's degree",
            "bachelor's degree",
            "high school",
            "master's degree",
            "some college",
            "some high school",
        ],
    ),
    ("lunch", "Lunch Type", &["free/reduced", "standard"]),
    ("test preparation course", "Test Preparation Course", &["none", "completed"]),
];

const SCORE_INPUTS: [(&str, &str); 2] = [("reading score", "Reading Score"), ("writing score", "Writing Score")];

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    )
}

/// Landing page with a link to the prediction form.
pub fn index_page() -> String {
    layout(
        "Student Exam Performance",
        "<h1>Student Exam Performance Indicator</h1>\n<p><a href=\"/predictdata\">Predict a math score</a></p>",
    )
}

/// The prediction form, optionally followed by a result line.
pub fn form_page(result: Option<&str>) -> String {
    let mut body = String::from(
        "<h1>Student Exam Performance Prediction</h1>\n<form action=\"/predictdata\" method=\"post\">\n",
    );

    for (name, label, options) in FORM_SELECTS {
        body.push_str(&format!(
            "<label>{label}<select name=\"{}\" required>\n<option value=\"\" disabled selected>Select {label}</option>\n",
            escape_html(name)
        ));
        for option in options {
            let option = escape_html(option);
            body.push_str(&format!("<option value=\"{option}\">{option}</option>\n"));
        }
        body.push_str("</select></label>\n");
    }
    for (name, label) in SCORE_INPUTS {
        body.push_str(&format!(
            "<label>{label}<input type=\"number\" name=\"{}\" min=\"0\" max=\"100\" required></label>\n",
            escape_html(name)
        ));
    }
    body.push_str("<input type=\"submit\" value=\"Predict your Maths Score\">\n</form>\n");

    if let Some(result) = result {
        body.push_str(&format!(
            "<h2 class=\"result\">The prediction is {}</h2>\n",
            escape_html(result)
        ));
    }

    layout("Student Exam Performance Prediction", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn form_has_every_request_field() {
        let page = form_page(None);
        for name in crate::domain::REQUEST_COLUMNS {
            assert!(page.contains(&format!("name=\"{name}\"")), "{name}");
        }
        assert!(!page.contains("class=\"result\""));
    }

    #[test]
    fn result_text_is_escaped() {
        let page = form_page(Some("Error: <script>"));
        assert!(page.contains("The prediction is Error: &lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
