use rustrict::CensorStr;

#[derive(Debug)]
pub struct ProfanityFilter;

impl ProfanityFilter {
    pub fn contains_profanity(text: &str) -> bool {
        text.is_inappropriate()
    }
}
