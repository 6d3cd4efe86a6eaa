use std::io::Cursor;

use stencil_shared::Target;

use super::{ConversionInput, ConvertError, Converter, GeneratedFile};

/// Page layout inferred from the screenshot's aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Wide,
    Standard,
    Tall,
}

impl Layout {
    fn from_dimensions(width: u32, height: u32) -> Self {
        let ratio = width as f64 / height as f64;
        if ratio > 1.5 {
            Layout::Wide
        } else if ratio < 0.8 {
            Layout::Tall
        } else {
            Layout::Standard
        }
    }

    fn sections(self) -> &'static [&'static str] {
        match self {
            Layout::Tall => &["hero", "features-list", "testimonials", "cta"],
            Layout::Wide | Layout::Standard => &["hero", "features-grid", "cta"],
        }
    }
}

/// Emits a deterministic starter pack sized to the screenshot.
///
/// The pack does not attempt visual fidelity: it reads the image dimensions,
/// picks a section layout and writes the same skeleton every time.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScaffoldConverter;

impl Converter for ScaffoldConverter {
    fn convert(&self, input: &ConversionInput) -> Result<Vec<GeneratedFile>, ConvertError> {
        let (width, height) = image::ImageReader::new(Cursor::new(&input.image))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| ConvertError::Decode(e.to_string()))?;
        if width == 0 || height == 0 {
            return Err(ConvertError::Decode(format!("empty image {width}x{height}")));
        }

        let layout = Layout::from_dimensions(width, height);
        tracing::debug!(width, height, ?layout, target = %input.target, "Generating pack");

        let title = sanitize_text(input.title.trim());
        Ok(match input.target {
            Target::Django => django_pack(&title, width, height, layout),
            Target::Nextjs => nextjs_pack(&title, width, height, layout)?,
        })
    }
}

/// Strip control characters and anything outside the basic multilingual plane.
fn sanitize_text(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() && (*c as u32) <= 0xFFFF)
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn readme(framework: &str, title: &str, width: u32, height: u32, layout: Layout, steps: &str) -> String {
    format!(
        "# {framework} Template Pack: {title}\n\n\
         Generated from an uploaded screenshot ({width}x{height}).\n\n\
         Sections: {}\n\n\
         ## Installation\n\n{steps}\n",
        layout.sections().join(", ")
    )
}

const DJANGO_HEADER: &str = r##"<header class="bg-white shadow-sm">
  <nav class="container mx-auto px-4 py-4 flex items-center justify-between">
    <h1 class="text-2xl font-bold text-gray-800">{{ site_name|default:"YourSite" }}</h1>
    <div class="hidden md:flex space-x-8">
      <a href="#" class="text-gray-600">Home</a>
      <a href="#" class="text-gray-600">Features</a>
      <a href="#" class="text-gray-600">Contact</a>
    </div>
  </nav>
</header>
"##;

const DJANGO_FOOTER: &str = r##"<footer class="bg-gray-800 text-white py-8">
  <div class="container mx-auto px-4 text-center">
    <p class="text-gray-400">&copy; {% now "Y" %} {{ site_name|default:"YourSite" }}. All rights reserved.</p>
  </div>
</footer>
"##;

const DJANGO_CSS: &str = ".hero {\n    background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);\n}\n\n\
.cta {\n    background: linear-gradient(135deg, #2c3e50 0%, #3498db 100%);\n}\n\n\
@media (max-width: 768px) {\n    .hero h1 {\n        font-size: 2.5rem;\n    }\n}\n";

const DJANGO_VIEWS: &str = "from django.shortcuts import render\n\n\n\
def main_index(request):\n    return render(request, \"main/index.html\", {})\n";

fn django_section(name: &str, title: &str) -> String {
    match name {
        "hero" => format!(
            "    <section class=\"hero text-white py-20\">\n      \
             <div class=\"container mx-auto px-4 text-center\">\n        \
             <h1 class=\"text-5xl font-bold mb-6\">{{{{ hero_title|default:\"{title}\" }}}}</h1>\n      \
             </div>\n    </section>\n"
        ),
        "features-grid" => "    <section class=\"features py-16\">\n      \
             <div class=\"grid md:grid-cols-3 gap-8\">\n        \
             {% for feature in features %}<div class=\"p-6 bg-white rounded-lg shadow-md\">{{ feature.title }}</div>{% endfor %}\n      \
             </div>\n    </section>\n"
            .to_string(),
        "features-list" => "    <section class=\"features py-16\">\n      \
             <ul class=\"space-y-6\">\n        \
             {% for feature in features %}<li class=\"p-6 bg-white rounded-lg shadow-md\">{{ feature.title }}</li>{% endfor %}\n      \
             </ul>\n    </section>\n"
            .to_string(),
        "testimonials" => "    <section class=\"testimonials py-16 bg-gray-100\">\n      \
             {% for quote in testimonials %}<blockquote class=\"mb-6\">{{ quote }}</blockquote>{% endfor %}\n    \
             </section>\n"
            .to_string(),
        _ => "    <section class=\"cta text-white py-16 text-center\">\n      \
             <a href=\"#\" class=\"bg-blue-600 px-8 py-3 rounded-lg\">{{ cta_button|default:\"Get Started\" }}</a>\n    \
             </section>\n"
            .to_string(),
    }
}

fn django_pack(title: &str, width: u32, height: u32, layout: Layout) -> Vec<GeneratedFile> {
    let escaped = escape_html(title);
    let body: String = layout
        .sections()
        .iter()
        .map(|name| django_section(name, &escaped))
        .collect();

    let index = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"UTF-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>{escaped}</title>\n  \
         <link rel=\"stylesheet\" href=\"{{{{ STATIC_URL }}}}main/css/custom.css\">\n</head>\n\
         <body class=\"bg-gray-50\">\n  {{% include 'main/partials/header.html' %}}\n  \
         <main>\n{body}  </main>\n  {{% include 'main/partials/footer.html' %}}\n</body>\n</html>\n"
    );

    let steps = "1. Copy `templates/main/` into your templates directory.\n\
                 2. Copy `static/main/` into your static directory.\n\
                 3. Route a URL to `views.main_index`.";

    vec![
        GeneratedFile::text("django_pack/templates/main/index.html", index),
        GeneratedFile::text("django_pack/templates/main/partials/header.html", DJANGO_HEADER),
        GeneratedFile::text("django_pack/templates/main/partials/footer.html", DJANGO_FOOTER),
        GeneratedFile::text("django_pack/static/main/css/custom.css", DJANGO_CSS),
        GeneratedFile::text("django_pack/views.py", DJANGO_VIEWS),
        GeneratedFile::text(
            "django_pack/README.md",
            readme("Django", title, width, height, layout, steps),
        ),
    ]
}

const NEXT_LAYOUT: &str = "export default function MainLayout({\n  children,\n}: {\n  children: React.ReactNode\n}) {\n  \
return <div className=\"main-template\">{children}</div>\n}\n";

const NEXT_HEADER: &str = "export function Header() {\n  return (\n    \
<header className=\"bg-white shadow-sm\">\n      \
<nav className=\"container mx-auto px-4 py-4 flex items-center justify-between\">\n        \
<h1 className=\"text-2xl font-bold text-gray-800\">YourSite</h1>\n      </nav>\n    </header>\n  )\n}\n";

const NEXT_FOOTER: &str = "export function Footer() {\n  return (\n    \
<footer className=\"bg-gray-800 text-white py-8 text-center\">\n      \
&copy; {new Date().getFullYear()} YourSite. All rights reserved.\n    </footer>\n  )\n}\n";

fn nextjs_section(name: &str) -> &'static str {
    match name {
        "hero" => "        <section className=\"bg-gradient-to-r from-blue-600 to-purple-600 text-white py-20 text-center\">\n          \
                   <h1 className=\"text-5xl font-bold mb-6\">{title}</h1>\n        </section>\n",
        "features-grid" => "        <section className=\"py-16 grid md:grid-cols-3 gap-8\">\n          \
                            {features.map((f) => <div key={f} className=\"p-6 bg-white rounded-lg shadow-md\">{f}</div>)}\n        </section>\n",
        "features-list" => "        <section className=\"py-16\">\n          \
                            <ul className=\"space-y-6\">{features.map((f) => <li key={f}>{f}</li>)}</ul>\n        </section>\n",
        "testimonials" => "        <section className=\"py-16 bg-gray-100\">\n          \
                           <blockquote>Loved by teams everywhere.</blockquote>\n        </section>\n",
        _ => "        <section className=\"bg-gray-800 text-white py-16 text-center\">\n          \
              <button className=\"bg-blue-600 px-8 py-3 rounded-lg\">Get Started</button>\n        </section>\n",
    }
}

fn nextjs_pack(
    title: &str,
    width: u32,
    height: u32,
    layout: Layout,
) -> Result<Vec<GeneratedFile>, ConvertError> {
    let title_literal =
        serde_json::to_string(title).map_err(|e| ConvertError::Encoding(e.to_string()))?;
    let body: String = layout.sections().iter().map(|name| nextjs_section(name)).collect();

    let page = format!(
        "import {{ Header }} from '@/components/Main/Header'\n\
         import {{ Footer }} from '@/components/Main/Footer'\n\n\
         const title = {title_literal}\n\
         const features = [\"Fast Performance\", \"Reliable\", \"Secure\"]\n\n\
         export default function MainPage() {{\n  return (\n    \
         <div className=\"min-h-screen bg-gray-50\">\n      <Header />\n      <main>\n{body}      </main>\n      \
         <Footer />\n    </div>\n  )\n}}\n"
    );

    let steps = "1. Copy `app/(main)/` into your app directory.\n\
                 2. Copy `components/Main/` into your components directory.\n\
                 3. Make sure Tailwind CSS scans the copied paths.";

    let preview = format!(
        "Preview placeholder\nImage dimensions: {width}x{height}\nAspect ratio: {:.2}\n",
        width as f64 / height as f64
    );

    Ok(vec![
        GeneratedFile::text("next_pack/app/(main)/page.tsx", page),
        GeneratedFile::text("next_pack/app/(main)/layout.tsx", NEXT_LAYOUT),
        GeneratedFile::text("next_pack/components/Main/Header.tsx", NEXT_HEADER),
        GeneratedFile::text("next_pack/components/Main/Footer.tsx", NEXT_FOOTER),
        GeneratedFile::text("next_pack/public/main/preview.txt", preview),
        GeneratedFile::text(
            "next_pack/README.md",
            readme("Next.js", title, width, height, layout, steps),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn input(target: Target, image: Vec<u8>) -> ConversionInput {
        ConversionInput {
            title: "Homepage <v1>".into(),
            target,
            image,
        }
    }

    fn file<'a>(files: &'a [GeneratedFile], path: &str) -> &'a str {
        let found = files.iter().find(|f| f.path == path).unwrap();
        std::str::from_utf8(&found.contents).unwrap()
    }

    #[test]
    fn test_layout_from_dimensions() {
        assert_eq!(Layout::from_dimensions(1920, 1080), Layout::Wide);
        assert_eq!(Layout::from_dimensions(1200, 1000), Layout::Standard);
        assert_eq!(Layout::from_dimensions(400, 900), Layout::Tall);
    }

    #[test]
    fn test_django_pack() {
        let files = ScaffoldConverter
            .convert(&input(Target::Django, png(400, 900)))
            .unwrap();

        assert!(files.iter().all(|f| f.path.starts_with("django_pack/")));
        let index = file(&files, "django_pack/templates/main/index.html");
        assert!(index.contains("Homepage &lt;v1&gt;"));
        assert!(index.contains("testimonials"));
        assert!(file(&files, "django_pack/README.md").contains("400x900"));
    }

    #[test]
    fn test_django_partials_are_complete() {
        let files = ScaffoldConverter
            .convert(&input(Target::Django, png(1200, 1000)))
            .unwrap();

        let header = file(&files, "django_pack/templates/main/partials/header.html");
        assert!(header.contains(r##"<a href="#" class="text-gray-600">Contact</a>"##));
        assert!(header.trim_end().ends_with("</header>"));
        let footer = file(&files, "django_pack/templates/main/partials/footer.html");
        assert!(footer.trim_end().ends_with("</footer>"));
    }

    #[test]
    fn test_nextjs_pack() {
        let files = ScaffoldConverter
            .convert(&input(Target::Nextjs, png(1600, 800)))
            .unwrap();

        assert!(files.iter().all(|f| f.path.starts_with("next_pack/")));
        let page = file(&files, "next_pack/app/(main)/page.tsx");
        assert!(page.contains("const title = \"Homepage <v1>\""));
        assert!(!page.contains("testimonials"));
    }

    #[test]
    fn test_same_input_same_output() {
        let a = ScaffoldConverter.convert(&input(Target::Nextjs, png(64, 64))).unwrap();
        let b = ScaffoldConverter.convert(&input(Target::Nextjs, png(64, 64))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_undecodable_image_fails() {
        let err = ScaffoldConverter
            .convert(&input(Target::Django, b"definitely not an image".to_vec()))
            .unwrap_err();
        assert!(err.failure_log().starts_with("CONVERSION ERROR"));
    }

    #[test]
    fn test_sanitize_text_drops_emoji_and_controls() {
        assert_eq!(sanitize_text("Launch \u{1F680}\tpage"), "Launch page");
    }
}
