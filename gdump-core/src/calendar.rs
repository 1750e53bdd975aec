use crate::{CalendarDocument, CalendarEvent, RefinedCourseRow, classify::event_title};

impl CalendarEvent {
    /// One event for one course block
    pub fn from_course(course: &RefinedCourseRow) -> Self {
        Self {
            title: event_title(&course.course_name),
            start: course.start_time,
            end: course.end_time,
            description: format!(
                "Block: {}\nTeacher: {}\nRoom: {}",
                course.block, course.teacher, course.room
            ),
            location: course.room.clone(),
            color: course.color.to_uppercase(),
        }
    }
}

impl CalendarDocument {
    /// Empty calendar named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Vec::new(),
        }
    }

    /// Build one event per course. Overlapping or identical courses are all kept.
    pub fn from_courses<'a>(
        name: impl Into<String>,
        courses: impl IntoIterator<Item = &'a RefinedCourseRow>,
    ) -> Self {
        let mut calendar = Self::new(name);
        calendar.extend(courses);
        calendar
    }

    /// Append one event per course
    pub fn extend<'a>(&mut self, courses: impl IntoIterator<Item = &'a RefinedCourseRow>) {
        self.events
            .extend(courses.into_iter().map(CalendarEvent::from_course));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
