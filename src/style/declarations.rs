// Inline style declarations (the `style` attribute)
// Declarations keep their order; setting an existing property updates it in place.

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDeclarations {
    declarations: Vec<Declaration>,
}

impl StyleDeclarations {
    /// Parse `name: value [!important]; ...`
    pub fn parse(text: &str) -> Self {
        let mut style = StyleDeclarations::default();
        for item in text.split(';') {
            let Some((name, value)) = item.split_once(':') else {
                continue;
            };
            let value = value.trim();
            let (value, important) = match value.strip_suffix("!important") {
                Some(rest) => (rest.trim_end(), true),
                None => (value, false),
            };
            // within one block an important declaration beats a later normal one
            if !important && style.is_important(name.trim()) {
                continue;
            }
            style.set_property(name, value, important);
        }
        style
    }

    /// `setProperty`: an empty value removes the property, any other value
    /// replaces the existing declaration together with its priority
    pub fn set_property(&mut self, name: &str, value: &str, important: bool) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() {
            return;
        }
        if value.is_empty() {
            self.remove_property(&name);
            return;
        }
        match self.declarations.iter_mut().find(|d| d.name == name) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.important = important;
            }
            None => self.declarations.push(Declaration {
                name,
                value: value.to_string(),
                important,
            }),
        }
    }

    /// `removeProperty`: returns the old value
    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let index = self
            .declarations
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))?;
        Some(self.declarations.remove(index).value)
    }

    pub fn get_property_value(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .map(|d| d.value.as_str())
    }

    pub fn is_important(&self, name: &str) -> bool {
        self.declarations
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(name) && d.important)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Serialized form used for the `style` attribute
    pub fn to_css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.name, d.value)
                } else {
                    format!("{}: {};", d.name, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
