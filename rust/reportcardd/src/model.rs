use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(alias = "عالی")]
    Excellent,
    #[serde(alias = "خوب")]
    Good,
    #[serde(alias = "متوسط")]
    Average,
    #[serde(alias = "ضعیف")]
    Poor,
}

pub const STATUS_EMOJI: [&str; 4] = ["😍", "🙂", "😐", "😞"];

impl Status {
    pub fn emoji(self) -> &'static str {
        match self {
            Status::Excellent => STATUS_EMOJI[0],
            Status::Good => STATUS_EMOJI[1],
            Status::Average => STATUS_EMOJI[2],
            Status::Poor => STATUS_EMOJI[3],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum League {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

impl League {
    pub const ALL: [League; 4] = [League::Bronze, League::Silver, League::Gold, League::Diamond];

    pub fn as_str(self) -> &'static str {
        match self {
            League::Bronze => "Bronze",
            League::Silver => "Silver",
            League::Gold => "Gold",
            League::Diamond => "Diamond",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            League::Bronze => "🥉",
            League::Silver => "🥈",
            League::Gold => "🥇",
            League::Diamond => "💎",
        }
    }

    /// Total taz needed to leave this league. The top tier has none.
    pub fn next_threshold(self) -> Option<i64> {
        match self {
            League::Bronze => Some(8000),
            League::Silver => Some(10000),
            League::Gold => Some(12000),
            League::Diamond => None,
        }
    }

    pub fn previous(self) -> Option<League> {
        let idx = League::ALL.iter().position(|l| *l == self)?;
        idx.checked_sub(1).map(|i| League::ALL[i])
    }

    pub fn next(self) -> Option<League> {
        let idx = League::ALL.iter().position(|l| *l == self)?;
        League::ALL.get(idx + 1).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub country: u32,
    pub region: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillNode {
    pub id: String,
    pub name: String,
    pub mastery: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SkillNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub taz: i64,
    pub history: Vec<i64>,
    pub correct: u32,
    pub wrong: u32,
    pub blank: u32,
    pub vs_average: String,
    pub status_emoji: String,
    #[serde(default)]
    pub percent_with_negative: f64,
    #[serde(default)]
    pub percent_without_negative: f64,
    #[serde(default)]
    pub taz_if_no_wrong: i64,
    pub rank: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_tree: Option<Vec<SkillNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub name: String,
    pub taz: i64,
    pub date: String,
}

impl Exam {
    pub fn is_completed(&self) -> bool {
        self.taz > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub city: String,
    pub region: String,
    pub exam_date: String,
    pub status: Status,
    pub status_emoji: String,
    pub total_taz: i64,
    pub rank: Rank,
    pub average_taz: i64,
    pub league: League,
    pub subjects: Vec<Subject>,
    pub achievements: Vec<String>,
    pub badges_unlocked: Vec<String>,
    pub exams: Vec<Exam>,
    pub total_correct: u32,
    pub total_wrong: u32,
    pub total_blank: u32,
    pub total_participants: u32,
    pub absence_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_badges: Option<Vec<String>>,
}

impl StudentRecord {
    pub fn completed_exams(&self) -> Vec<&Exam> {
        self.exams.iter().filter(|e| e.is_completed()).collect()
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BadgeDefinition {
    pub emoji: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub static BADGE_CATALOG: [BadgeDefinition; 15] = [
    BadgeDefinition { emoji: "🏅", name: "رتبه برتر", description: "در 10 درصد برتر کشور قرار گرفتید" },
    BadgeDefinition { emoji: "💯", name: "نمره کامل", description: "نمره کامل در یک درس" },
    BadgeDefinition { emoji: "⚡", name: "پیوستگی", description: "5 آزمون متوالی شرکت کرده‌اید" },
    BadgeDefinition { emoji: "🧠", name: "تسلط بر درس", description: "تسلط کامل بر یک درس" },
    BadgeDefinition { emoji: "🎯", name: "بهبود چشمگیر", description: "بهبود 1000 تراز نسبت به آزمون قبل" },
    BadgeDefinition { emoji: "🔥", name: "روند صعودی", description: "روند صعودی 3 آزمون" },
    BadgeDefinition { emoji: "🚀", name: "رشد سریع", description: "رشد سریع در یک ماه" },
    BadgeDefinition { emoji: "💎", name: "لیگ الماس", description: "ورود به لیگ الماس" },
    BadgeDefinition { emoji: "📈", name: "پیشرفت مداوم", description: "بهبود مستمر در 5 آزمون" },
    BadgeDefinition { emoji: "🎖️", name: "تلاش پیگیر", description: "شرکت در تمام آزمون‌ها" },
    BadgeDefinition { emoji: "💪", name: "نقطه قوت", description: "دارای 3 درس با تراز بالای 11000" },
    BadgeDefinition { emoji: "🌟", name: "درخشان", description: "میانگین تراز بالای 10000" },
    BadgeDefinition { emoji: "🏁", name: "آماده کنکور", description: "شرکت در همه آزمون‌ها تا کنکور" },
    BadgeDefinition { emoji: "📚", name: "مطالعه منظم", description: "بهبود در تمام دروس" },
    BadgeDefinition { emoji: "✨", name: "استعداد درخشان", description: "رتبه زیر 500 کشوری" },
];

pub const AVATARS: [&str; 12] = [
    "🎓", "📚", "✏️", "🎯", "🏆", "⭐", "💡", "🚀", "🔥", "⚡", "💪", "🧠",
];

pub const PROFILE_COLORS: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
];

pub const MAX_VISIBLE_BADGES: usize = 3;

pub fn badge(emoji: &str) -> Option<&'static BadgeDefinition> {
    BADGE_CATALOG.iter().find(|b| b.emoji == emoji)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("status emoji {found} does not match status {status:?} (expected {expected})")]
    StatusEmojiMismatch {
        status: Status,
        expected: &'static str,
        found: String,
    },
    #[error("subject {0} has an unknown status emoji")]
    SubjectStatusEmoji(String),
    #[error("duplicate subject name: {0}")]
    DuplicateSubject(String),
    #[error("duplicate skill id {id} in subject {subject}")]
    DuplicateSkillId { subject: String, id: String },
    #[error("exam {0} is completed after a not-yet-taken exam")]
    ExamOrder(String),
    #[error("rank must be positive")]
    RankNotPositive,
    #[error("badge {0} is not in the badge catalog")]
    UnknownBadge(String),
    #[error("visible badge {0} is not unlocked")]
    VisibleBadgeLocked(String),
    #[error("visible badge {0} is listed twice")]
    DuplicateVisibleBadge(String),
    #[error("at most 3 visible badges allowed, got {0}")]
    TooManyVisibleBadges(usize),
    #[error("avatar {0} is not in the avatar catalog")]
    UnknownAvatar(String),
    #[error("profile color {0} is not in the palette")]
    UnknownProfileColor(String),
}

/// Checks every invariant a restored or merged record must satisfy.
/// History alignment is reported separately by `metrics::history_alignment`.
pub fn validate(record: &StudentRecord) -> Result<(), ValidationError> {
    if record.status.emoji() != record.status_emoji {
        return Err(ValidationError::StatusEmojiMismatch {
            status: record.status,
            expected: record.status.emoji(),
            found: record.status_emoji.clone(),
        });
    }

    let mut names = HashSet::new();
    for subject in &record.subjects {
        if !STATUS_EMOJI.contains(&subject.status_emoji.as_str()) {
            return Err(ValidationError::SubjectStatusEmoji(subject.name.clone()));
        }
        if !names.insert(subject.name.as_str()) {
            return Err(ValidationError::DuplicateSubject(subject.name.clone()));
        }
        if let Some(tree) = &subject.skill_tree {
            let mut ids = HashSet::new();
            check_skill_ids(&subject.name, tree, &mut ids)?;
        }
    }

    let mut seen_pending = false;
    for exam in &record.exams {
        if exam.is_completed() {
            if seen_pending {
                return Err(ValidationError::ExamOrder(exam.name.clone()));
            }
        } else {
            seen_pending = true;
        }
    }

    if record.rank.country == 0 || record.rank.region == 0 {
        return Err(ValidationError::RankNotPositive);
    }

    for emoji in &record.badges_unlocked {
        if badge(emoji).is_none() {
            return Err(ValidationError::UnknownBadge(emoji.clone()));
        }
    }

    if let Some(visible) = &record.visible_badges {
        check_visible_badges(visible, &record.badges_unlocked)?;
    }

    if let Some(avatar) = &record.avatar {
        if !AVATARS.contains(&avatar.as_str()) {
            return Err(ValidationError::UnknownAvatar(avatar.clone()));
        }
    }
    if let Some(color) = &record.profile_color {
        if !PROFILE_COLORS.contains(&color.as_str()) {
            return Err(ValidationError::UnknownProfileColor(color.clone()));
        }
    }

    Ok(())
}

pub fn check_visible_badges(visible: &[String], unlocked: &[String]) -> Result<(), ValidationError> {
    if visible.len() > MAX_VISIBLE_BADGES {
        return Err(ValidationError::TooManyVisibleBadges(visible.len()));
    }
    let mut seen = HashSet::new();
    for emoji in visible {
        if !unlocked.contains(emoji) {
            return Err(ValidationError::VisibleBadgeLocked(emoji.clone()));
        }
        if !seen.insert(emoji.as_str()) {
            return Err(ValidationError::DuplicateVisibleBadge(emoji.clone()));
        }
    }
    Ok(())
}

fn check_skill_ids<'a>(
    subject: &str,
    nodes: &'a [SkillNode],
    ids: &mut HashSet<&'a str>,
) -> Result<(), ValidationError> {
    for node in nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateSkillId {
                subject: subject.to_string(),
                id: node.id.clone(),
            });
        }
        if let Some(children) = &node.children {
            check_skill_ids(subject, children, ids)?;
        }
    }
    Ok(())
}

fn skill(id: &str, name: &str, mastery: f64) -> SkillNode {
    SkillNode {
        id: id.to_string(),
        name: name.to_string(),
        mastery,
        children: None,
    }
}

fn leaf_skill(id: &str, name: &str, mastery: f64) -> SkillNode {
    SkillNode {
        children: Some(Vec::new()),
        ..skill(id, name, mastery)
    }
}

fn exam(name: &str, taz: i64, date: &str) -> Exam {
    Exam {
        name: name.to_string(),
        taz,
        date: date.to_string(),
    }
}

struct SubjectSeed<'a> {
    name: &'a str,
    taz: i64,
    history: [i64; 5],
    answers: (u32, u32, u32),
    percents: (f64, f64),
    vs_average: &'a str,
    status_emoji: &'a str,
    taz_if_no_wrong: i64,
    rank: u32,
}

fn subject(seed: SubjectSeed<'_>, skill_tree: Vec<SkillNode>) -> Subject {
    Subject {
        name: seed.name.to_string(),
        taz: seed.taz,
        history: seed.history.to_vec(),
        correct: seed.answers.0,
        wrong: seed.answers.1,
        blank: seed.answers.2,
        vs_average: seed.vs_average.to_string(),
        status_emoji: seed.status_emoji.to_string(),
        percent_with_negative: seed.percents.0,
        percent_without_negative: seed.percents.1,
        taz_if_no_wrong: seed.taz_if_no_wrong,
        rank: seed.rank,
        skill_tree: Some(skill_tree),
    }
}

/// Built-in record used when a workspace has no usable saved record.
pub fn seed_record() -> StudentRecord {
    let subjects = vec![
        subject(
            SubjectSeed {
                name: "ریاضی و آمار",
                taz: 12654,
                history: [11800, 12050, 12300, 12600, 12654],
                answers: (9, 0, 6),
                percents: (60.0, 60.0),
                vs_average: "+47%",
                status_emoji: "😍",
                taz_if_no_wrong: 12654,
                rank: 30,
            },
            vec![
                leaf_skill("math-1", "معادله درجه دوم", 50.0),
                leaf_skill("math-2", "مفهوم و ضابطه تابع", 100.0),
                leaf_skill("math-3", "نمودار تابع", 0.0),
                leaf_skill("math-4", "گردآوری داده ها", 100.0),
                leaf_skill("math-5", "خلاصه عددی دادهها", 66.67),
                leaf_skill("math-6", "نمایش داده ها", 66.67),
            ],
        ),
        subject(
            SubjectSeed {
                name: "زبان و ادبیات فارسی",
                taz: 10349,
                history: [9800, 9950, 10100, 10200, 10349],
                answers: (13, 4, 3),
                percents: (58.33, 65.0),
                vs_average: "+34%",
                status_emoji: "😍",
                taz_if_no_wrong: 10836,
                rank: 232,
            },
            vec![
                skill("lit-1", "فصل اول", 100.0),
                skill("lit-2", "فصل دوم", 26.67),
                skill("lit-3", "فصل سوم", 61.11),
                skill("lit-4", "فصل چهارم", 70.83),
            ],
        ),
        subject(
            SubjectSeed {
                name: "علوم اجتماعی",
                taz: 9383,
                history: [8900, 9000, 9100, 9250, 9383],
                answers: (11, 2, 2),
                percents: (68.89, 73.33),
                vs_average: "+26%",
                status_emoji: "🙂",
                taz_if_no_wrong: 9644,
                rank: 624,
            },
            vec![
                skill("social-1", "اجتماع", 100.0),
                skill("social-2", "جهان اجتماعی", 100.0),
                skill("social-3", "پیامدها و ارزیابی جهان اجتماعی", 33.33),
                skill("social-4", "هویت فردی و اجتماعی", 66.67),
                skill("social-5", "علل تحوالت هویتی", 100.0),
                skill("social-6", "هویت فرهنگی، تاریخی", -16.67),
                skill("social-7", "هویت سیاسی اقتصادی", 100.0),
            ],
        ),
        subject(
            SubjectSeed {
                name: "روانشناسی",
                taz: 9717,
                history: [9200, 9350, 9500, 9600, 9717],
                answers: (7, 3, 0),
                percents: (60.0, 70.0),
                vs_average: "+32%",
                status_emoji: "😍",
                taz_if_no_wrong: 10300,
                rank: 480,
            },
            vec![
                skill("psych-1", "تعریف و روش مورد مطالعه", 100.0),
                skill("psych-2", "روانشناسی رشد", 100.0),
                skill("psych-3", "احساس، توجه و ادراک", 100.0),
                skill("psych-4", "حافظه", 100.0),
                skill("psych-5", "حل مسئله", -33.33),
                skill("psych-6", "تصمیمگیری", 33.33),
                skill("psych-7", "انگیزه و نگرش", 100.0),
                skill("psych-8", "روانشناسی سلامت", -33.33),
            ],
        ),
        subject(
            SubjectSeed {
                name: "زبان عربی",
                taz: 9920,
                history: [9400, 9500, 9650, 9800, 9920],
                answers: (10, 3, 2),
                percents: (60.0, 66.67),
                vs_average: "+34%",
                status_emoji: "😍",
                taz_if_no_wrong: 10324,
                rank: 403,
            },
            vec![
                skill("arab-1", "درس اول", 100.0),
                skill("arab-2", "درس دوم", 100.0),
                skill("arab-3", "درس سوم", -33.33),
                skill("arab-4", "درس چهارم", 66.67),
                skill("arab-5", "درس پنجم", 50.0),
                skill("arab-6", "درس ششم", 100.0),
                skill("arab-7", "درس هفتم", 100.0),
                skill("arab-8", "درس هشتم", 11.11),
            ],
        ),
        subject(
            SubjectSeed {
                name: "تاریخ و جغرافیا",
                taz: 6169,
                history: [6700, 6500, 6400, 6300, 6169],
                answers: (0, 0, 20),
                percents: (0.0, 0.0),
                vs_average: "-23%",
                status_emoji: "😞",
                taz_if_no_wrong: 6169,
                rank: 7052,
            },
            vec![
                skill("hist-1", "تاریخ شناسی", 0.0),
                skill("hist-2", "جهان در عصر باستان", 0.0),
                skill("hist-3", "ایران تا ساسانیان", 0.0),
                skill("hist-4", "جامعه و حکومت در ایران باستان", 0.0),
                skill("hist-5", "فرهنگ ایران باستان", 0.0),
                skill("hist-6", "جغرافیا چیست", 0.0),
                skill("hist-7", "جغرافیا و ناهمواریهای ایران", 0.0),
                skill("hist-8", "آب و هوای ایران", 0.0),
                skill("hist-9", "منابع آب ایران", 0.0),
                skill("hist-10", "جمعیت و تقسیمات کشوری", 0.0),
                skill("hist-11", "توانهای اقتصادی ایران", 0.0),
            ],
        ),
        subject(
            SubjectSeed {
                name: "فلسفه و منطق",
                taz: 10790,
                history: [10200, 10350, 10500, 10650, 10790],
                answers: (11, 3, 6),
                percents: (50.0, 55.0),
                vs_average: "+34%",
                status_emoji: "😍",
                taz_if_no_wrong: 11222,
                rank: 178,
            },
            vec![
                skill("phil-1", "منطق و معنا و مفهوم", -33.33),
                skill("phil-2", "منطق و معنا و مفهوم", 100.0),
                skill("phil-3", "تعریف", 0.0),
                skill("phil-4", "تعریف", 100.0),
                skill("phil-5", "استدلال استقرایی", 0.0),
                skill("phil-6", "قضیه حملی و احکام قضایا", 50.0),
                skill("phil-7", "قیاس اقترانی", 100.0),
                skill("phil-8", "قضیه شرطی و قیاس استثنایی", 100.0),
                skill("phil-9", "منطق کاربردی", 100.0),
                skill("phil-10", "تعریف و ریشه فلسفه", 50.0),
                skill("phil-11", "زندگی و فلسفه", 11.11),
                skill("phil-12", "امکان و ابزار شناخت", 100.0),
                skill("phil-13", "تاریخچه معرفت", 0.0),
                skill("phil-14", "انسان و فلسفه", 0.0),
                skill("phil-15", "اخلاق و فلسفه", 100.0),
            ],
        ),
        subject(
            SubjectSeed {
                name: "اقتصاد",
                taz: 8707,
                history: [8200, 8350, 8500, 8600, 8707],
                answers: (3, 2, 5),
                percents: (23.33, 30.0),
                vs_average: "+10%",
                status_emoji: "😐",
                taz_if_no_wrong: 9298,
                rank: 995,
            },
            vec![
                skill("econ-1", "اصول انتخاب در کسب و کار", 100.0),
                skill("econ-2", "بازار", 0.0),
                skill("econ-3", "دولت و اقتصاد و تجارت بین الملل", -16.67),
                skill("econ-4", "رکود و تورم", 0.0),
                skill("econ-5", "اقتصاد مقاومتی و رشد و پیشرفت", 0.0),
                skill("econ-6", "اقتصاد در خانواده", 33.33),
            ],
        ),
    ];

    StudentRecord {
        name: "حسین ذاکری".to_string(),
        city: "سمنان".to_string(),
        region: "2".to_string(),
        exam_date: "1404/07/03 - 14:29".to_string(),
        status: Status::Excellent,
        status_emoji: Status::Excellent.emoji().to_string(),
        total_taz: 9918,
        rank: Rank {
            country: 219,
            region: 124,
        },
        average_taz: 9143,
        league: League::Silver,
        subjects,
        achievements: ["Top 10%", "Perfect Subject", "Consistency", "Fast Learner", "Subject Master"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        badges_unlocked: ["🏅", "💯", "⚡", "🧠", "🎯"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        exams: vec![
            exam("تابستان", 9200, "1404/05/10"),
            exam("شهریور", 9500, "1404/06/15"),
            exam("مهر", 9918, "1404/07/03"),
            exam("آبان", 0, "1404/08/12"),
            exam("آذر", 0, "1404/09/20"),
            exam("دی", 0, "1404/10/15"),
            exam("بهمن", 0, "1404/11/10"),
            exam("اسفند", 0, "1404/12/05"),
            exam("فروردین", 0, "1405/01/15"),
            exam("اردیبهشت", 0, "1405/02/10"),
            exam("خرداد", 0, "1405/03/05"),
            exam("کنکور", 0, "1405/03/20"),
        ],
        total_correct: 64,
        total_wrong: 17,
        total_blank: 44,
        total_participants: 11902,
        absence_count: 6,
        avatar: Some("🎓".to_string()),
        profile_color: Some("#3b82f6".to_string()),
        visible_badges: Some(vec!["🏅".to_string(), "💯".to_string(), "⚡".to_string()]),
    }
}
